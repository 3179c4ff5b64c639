use log::debug;

use crate::sam::{ApplicationLocation, CfnApplication, Parameters, SERVERLESS_TRANSFORM};

pub const POWER_TUNER_APPLICATION_ID: &str =
    "arn:aws:serverlessrepo:us-east-1:451282441545:applications/aws-lambda-power-tuning";
pub const POWER_TUNER_SEMANTIC_VERSION: &str = "4.4.0";
pub const POWER_TUNER_LOGICAL_ID: &str = "powerTuner";
pub const DEFAULT_STACK_ID: &str = "TheLambdaPowerTunerStack";

const MAX_STACK_NAME_LENGTH: usize = 128;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("There is already a stack with id `{0}`")]
    DuplicateStack(String),

    #[error("Stack id `{0}` is not a valid stack name")]
    InvalidStackName(String),

    #[error("There is already a resource with logical id `{0}` in stack `{1}`")]
    DuplicateResource(String, String),
}

/// Root scope. Owns every stack declared during one invocation.
#[derive(Debug, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    pub fn new() -> Self {
        return Self { stacks: vec![] };
    }

    pub fn stacks(&self) -> &[Stack] {
        return &self.stacks;
    }

    pub fn stack(&self, id: &str) -> Option<&Stack> {
        return self.stacks.iter().find(|stack| stack.id == id);
    }

    fn add_stack(&mut self, stack: Stack) -> Result<&mut Stack, Error> {
        if !is_valid_stack_name(&stack.id) {
            return Err(Error::InvalidStackName(stack.id));
        }
        if self.stack(&stack.id).is_some() {
            return Err(Error::DuplicateStack(stack.id));
        }

        self.stacks.push(stack);
        let index = self.stacks.len() - 1;
        return Ok(&mut self.stacks[index]);
    }
}

pub fn is_valid_stack_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_letter = match chars.next() {
        Some(first) => first.is_ascii_alphabetic(),
        None => false,
    };

    return starts_with_letter
        && name.len() <= MAX_STACK_NAME_LENGTH
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackProps {
    pub description: Option<String>,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub id: String,
    pub description: Option<String>,
    transforms: Vec<String>,
    applications: Vec<CfnApplication>,
}

impl Stack {
    pub fn new<'a>(
        scope: &'a mut App,
        id: &str,
        description: Option<String>,
    ) -> Result<&'a mut Stack, Error> {
        let stack = Stack {
            id: id.to_string(),
            description,
            transforms: vec![],
            applications: vec![],
        };

        return scope.add_stack(stack);
    }

    pub fn add_transform(&mut self, transform: &str) {
        if !self.transforms.iter().any(|existing| existing == transform) {
            self.transforms.push(transform.to_string());
        }
    }

    pub fn add_application(&mut self, application: CfnApplication) -> Result<(), Error> {
        if self
            .applications
            .iter()
            .any(|existing| existing.logical_id == application.logical_id)
        {
            return Err(Error::DuplicateResource(
                application.logical_id,
                self.id.clone(),
            ));
        }

        // SAM resources only deploy through the serverless transform.
        self.add_transform(SERVERLESS_TRANSFORM);
        self.applications.push(application);
        return Ok(());
    }

    pub fn transforms(&self) -> &[String] {
        return &self.transforms;
    }

    pub fn applications(&self) -> &[CfnApplication] {
        return &self.applications;
    }
}

/// Deploys aws-lambda-power-tuning from the Serverless Application Repository.
///
/// Parameters left out of `props` fall back to the application's own defaults.
pub struct PowerTunerStack;

impl PowerTunerStack {
    pub fn new<'a>(scope: &'a mut App, id: &str, props: StackProps) -> Result<&'a Stack, Error> {
        let stack = Stack::new(scope, id, props.description)?;

        let location = ApplicationLocation {
            application_id: String::from(POWER_TUNER_APPLICATION_ID),
            semantic_version: String::from(POWER_TUNER_SEMANTIC_VERSION),
        };
        debug!(
            "Declaring {} with {} parameter(s) in stack {}",
            POWER_TUNER_LOGICAL_ID,
            props.parameters.len(),
            id
        );
        stack.add_application(CfnApplication::new(
            POWER_TUNER_LOGICAL_ID,
            location,
            props.parameters,
        ))?;

        return Ok(stack);
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_stack_name;
    use super::App;
    use super::Error;
    use super::PowerTunerStack;
    use super::Stack;
    use super::StackProps;
    use super::POWER_TUNER_APPLICATION_ID;
    use crate::sam::{
        ApplicationLocation, CfnApplication, ParameterKey, Parameters, APPLICATION_RESOURCE_TYPE,
    };
    use crate::template::Template;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sar_application_created() {
        let mut app = App::new();
        let stack = PowerTunerStack::new(&mut app, "MyTestStack", StackProps::default()).unwrap();

        let template = Template::from_stack(stack).unwrap();
        template
            .has_resource_properties(
                APPLICATION_RESOURCE_TYPE,
                json!({
                    "Location": {
                        "ApplicationId": "arn:aws:serverlessrepo:us-east-1:451282441545:applications/aws-lambda-power-tuning"
                    }
                }),
            )
            .unwrap();
    }

    #[test]
    fn pins_the_semantic_version() {
        let mut app = App::new();
        let stack = PowerTunerStack::new(&mut app, "MyTestStack", StackProps::default()).unwrap();

        let template = Template::from_stack(stack).unwrap();
        template
            .has_resource_properties(
                APPLICATION_RESOURCE_TYPE,
                json!({ "Location": { "SemanticVersion": "4.4.0" } }),
            )
            .unwrap();
        template
            .resource_count_is(APPLICATION_RESOURCE_TYPE, 1)
            .unwrap();
        assert_eq!(1, template.resource_count());
    }

    #[test]
    fn default_parameters_are_absent() {
        let mut app = App::new();
        let stack = PowerTunerStack::new(&mut app, "MyTestStack", StackProps::default()).unwrap();

        let template = Template::from_stack(stack).unwrap();
        let resources = template.find_resources(APPLICATION_RESOURCE_TYPE);
        let properties = &resources["powerTuner"]["Properties"];
        assert_eq!(None, properties.get("Parameters"));
    }

    #[test]
    fn passes_parameters_unmodified() {
        let mut parameters = Parameters::new();
        parameters.insert(ParameterKey::PowerValues, String::from("128,256,512,1024,1536,3008"));
        parameters.insert(ParameterKey::TotalExecutionTimeout, String::from("300"));
        parameters.insert(ParameterKey::LambdaResource, String::from("*"));

        let mut app = App::new();
        let props = StackProps {
            description: None,
            parameters,
        };
        let stack = PowerTunerStack::new(&mut app, "MyTestStack", props).unwrap();

        let template = Template::from_stack(stack).unwrap();
        template
            .has_resource_properties(
                APPLICATION_RESOURCE_TYPE,
                json!({
                    "Location": { "ApplicationId": POWER_TUNER_APPLICATION_ID },
                    "Parameters": {
                        "PowerValues": "128,256,512,1024,1536,3008",
                        "totalExecutionTimeout": "300",
                        "lambdaResource": "*"
                    }
                }),
            )
            .unwrap();
    }

    #[test]
    fn adds_the_serverless_transform_once() {
        let mut app = App::new();
        let stack = Stack::new(&mut app, "Transforms", None).unwrap();
        for logical_id in ["first", "second"] {
            stack
                .add_application(CfnApplication::new(
                    logical_id,
                    ApplicationLocation {
                        application_id: String::from("arn:app"),
                        semantic_version: String::from("1.0.0"),
                    },
                    Parameters::new(),
                ))
                .unwrap();
        }

        assert_eq!(vec![String::from("AWS::Serverless-2016-10-31")], stack.transforms());
    }

    #[test]
    fn declares_into_the_owning_app() {
        let mut app = App::new();
        let stack = Stack::new(&mut app, "Declared", Some(String::from("tuner"))).unwrap();
        stack.add_transform("AWS::LanguageExtensions");

        let declared = app.stack("Declared").unwrap();
        assert_eq!(Some(String::from("tuner")), declared.description);
        assert_eq!(vec![String::from("AWS::LanguageExtensions")], declared.transforms());
    }

    #[test]
    fn every_parameter_renders_under_its_wire_name() {
        let mut parameters = Parameters::new();
        for key in ParameterKey::ALL {
            parameters.insert(key, format!("value-of-{}", key.as_str()));
        }

        let mut app = App::new();
        let props = StackProps {
            description: None,
            parameters,
        };
        let stack = PowerTunerStack::new(&mut app, "MyTestStack", props).unwrap();

        let template = Template::from_stack(stack).unwrap();
        let resources = template.find_resources(APPLICATION_RESOURCE_TYPE);
        let rendered = &resources["powerTuner"]["Properties"]["Parameters"];
        assert_eq!(12, rendered.as_object().unwrap().len());
        for key in ParameterKey::ALL {
            assert_eq!(
                format!("value-of-{}", key.as_str()),
                rendered[key.as_str()]
            );
        }
    }

    #[test]
    fn duplicate_stack_id() {
        let mut app = App::new();
        PowerTunerStack::new(&mut app, "MyTestStack", StackProps::default()).unwrap();

        let result = PowerTunerStack::new(&mut app, "MyTestStack", StackProps::default());
        assert_eq!(true, result.is_err());
        match result.err().unwrap() {
            Error::DuplicateStack(_) => {}
            _ => panic!("Expected `DuplicateStack` error"),
        }
        assert_eq!(1, app.stacks().len());
    }

    #[test]
    fn duplicate_logical_id() {
        let mut app = App::new();
        let stack = Stack::new(&mut app, "MyTestStack", None).unwrap();
        let application = CfnApplication::new(
            "powerTuner",
            ApplicationLocation {
                application_id: String::from("arn:app"),
                semantic_version: String::from("1.0.0"),
            },
            Parameters::new(),
        );

        stack.add_application(application.clone()).unwrap();
        let result = stack.add_application(application);
        assert_eq!(
            Err(Error::DuplicateResource(
                String::from("powerTuner"),
                String::from("MyTestStack")
            )),
            result
        );
    }

    #[test]
    fn invalid_stack_id() {
        let mut app = App::new();
        let result = PowerTunerStack::new(&mut app, "1-not-a-name", StackProps::default());
        match result.err().unwrap() {
            Error::InvalidStackName(_) => {}
            _ => panic!("Expected `InvalidStackName` error"),
        }
    }

    #[test]
    fn stack_names() {
        assert_eq!(true, is_valid_stack_name("TheLambdaPowerTunerStack"));
        assert_eq!(true, is_valid_stack_name("power-tuner-2"));
        assert_eq!(false, is_valid_stack_name(""));
        assert_eq!(false, is_valid_stack_name("power_tuner"));
        assert_eq!(false, is_valid_stack_name(&"a".repeat(129)));
    }
}
