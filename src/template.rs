use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::sam::CfnApplicationProps;
use crate::stack::Stack;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to render template: {0}")]
    RenderError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<Transform<'a>>,

    resources: BTreeMap<&'a str, ResourceBody<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Transform<'a> {
    Single(&'a str),
    Many(&'a [String]),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceBody<'a> {
    #[serde(rename = "Type")]
    resource_type: &'a str,
    properties: &'a CfnApplicationProps,
}

/// A stack rendered to its CloudFormation document.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    document: Value,
}

impl Template {
    pub fn from_stack(stack: &Stack) -> Result<Self, Error> {
        let transform = match stack.transforms() {
            [] => None,
            [single] => Some(Transform::Single(single)),
            many => Some(Transform::Many(many)),
        };

        let resources = stack
            .applications()
            .iter()
            .map(|application| {
                let body = ResourceBody {
                    resource_type: application.resource_type(),
                    properties: &application.props,
                };
                (application.logical_id.as_str(), body)
            })
            .collect();

        let body = TemplateBody {
            description: stack.description.as_deref(),
            transform,
            resources,
        };

        let document = match serde_json::to_value(&body) {
            Ok(document) => document,
            Err(error) => return Err(Error::RenderError(error.to_string())),
        };

        return Ok(Self { document });
    }

    pub fn as_value(&self) -> &Value {
        return &self.document;
    }

    pub fn resources(&self) -> BTreeMap<String, Value> {
        let resources = match self.document.get("Resources") {
            Some(Value::Object(resources)) => resources
                .iter()
                .map(|(logical_id, resource)| (logical_id.clone(), resource.clone()))
                .collect(),
            _ => BTreeMap::new(),
        };

        return resources;
    }

    pub fn resource_count(&self) -> usize {
        return self.resources().len();
    }

    pub fn render(&self, format: Format) -> Result<String, Error> {
        match format {
            Format::Json => self.to_json(),
            Format::Yaml => self.to_yaml(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        match serde_json::to_string_pretty(&self.document) {
            Ok(contents) => Ok(contents),
            Err(error) => Err(Error::RenderError(error.to_string())),
        }
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        match serde_yaml::to_string(&self.document) {
            Ok(contents) => Ok(contents),
            Err(error) => Err(Error::RenderError(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Format;
    use super::Template;
    use crate::sam::{ApplicationLocation, CfnApplication, ParameterKey, Parameters};
    use crate::stack::{App, PowerTunerStack, Stack, StackProps};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn renders_the_power_tuner_stack() {
        let mut app = App::new();
        let props = StackProps {
            description: Some(String::from("Lambda Power Tuning")),
            parameters: Parameters::new(),
        };
        let stack = PowerTunerStack::new(&mut app, "TheLambdaPowerTunerStack", props).unwrap();

        let template = Template::from_stack(stack).unwrap();
        assert_eq!(
            &json!({
                "Description": "Lambda Power Tuning",
                "Transform": "AWS::Serverless-2016-10-31",
                "Resources": {
                    "powerTuner": {
                        "Type": "AWS::Serverless::Application",
                        "Properties": {
                            "Location": {
                                "ApplicationId": "arn:aws:serverlessrepo:us-east-1:451282441545:applications/aws-lambda-power-tuning",
                                "SemanticVersion": "4.4.0"
                            }
                        }
                    }
                }
            }),
            template.as_value()
        );
    }

    #[test]
    fn empty_stack_has_no_transform() {
        let mut app = App::new();
        let stack = Stack::new(&mut app, "Empty", None).unwrap();

        let template = Template::from_stack(stack).unwrap();
        assert_eq!(&json!({ "Resources": {} }), template.as_value());
        assert_eq!(0, template.resource_count());
    }

    #[test]
    fn lists_multiple_transforms() {
        let mut app = App::new();
        let stack = Stack::new(&mut app, "Transforms", None).unwrap();
        stack.add_transform("AWS::LanguageExtensions");
        stack
            .add_application(CfnApplication::new(
                "app",
                ApplicationLocation {
                    application_id: String::from("arn:app"),
                    semantic_version: String::from("1.0.0"),
                },
                Parameters::new(),
            ))
            .unwrap();

        let template = Template::from_stack(stack).unwrap();
        assert_eq!(
            Some(&json!(["AWS::LanguageExtensions", "AWS::Serverless-2016-10-31"])),
            template.as_value().get("Transform")
        );
    }

    #[test]
    fn renders_yaml() {
        let mut parameters = Parameters::new();
        parameters.insert(ParameterKey::StateMachineNamePrefix, String::from("powerTuningStateMachine"));

        let mut app = App::new();
        let props = StackProps {
            description: None,
            parameters,
        };
        let stack = PowerTunerStack::new(&mut app, "TheLambdaPowerTunerStack", props).unwrap();

        let template = Template::from_stack(stack).unwrap();
        let contents = template.render(Format::Yaml).unwrap();
        let parsed: serde_json::Value = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(template.as_value(), &parsed);
        assert_eq!(true, contents.contains("stateMachineNamePrefix: powerTuningStateMachine"));
    }
}
