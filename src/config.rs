use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::BTreeMap, fs, io, path::PathBuf};
use validator::{Validate, ValidationError};

use crate::sam::{ParameterKey, Parameters};
use crate::stack::{is_valid_stack_name, StackProps, DEFAULT_STACK_ID};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConfigFile {
    pub location: PathBuf,
}

/// A parameter value as written in YAML. Only strings are passed on, sequences
/// of strings become the comma-delimited lists the application expects.
/// YAML numbers and booleans are parsed so they can be rejected with a hint to
/// quote them, their source text is already lost at that point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Flag(bool),
    Number(serde_yaml::Number),
    List(Vec<ParameterValue>),
}

impl ParameterValue {
    pub fn render(&self) -> String {
        match self {
            ParameterValue::Text(text) => text.clone(),
            ParameterValue::Flag(flag) => flag.to_string(),
            ParameterValue::Number(number) => number.to_string(),
            ParameterValue::List(values) => values
                .iter()
                .map(|value| value.render())
                .collect::<Vec<String>>()
                .join(","),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConfigEntry {
    #[validate(required, custom = "validate_stack_name")]
    pub stack_name: Option<String>,

    pub region: Option<String>,

    pub description: Option<String>,

    // A key left without a value (`PowerValues:`) is treated as unset.
    #[serde(default)]
    #[validate(custom = "validate_parameter_values")]
    pub parameters: BTreeMap<ParameterKey, Option<ParameterValue>>,

    #[validate(custom = "validate_json_file")]
    pub outputs: Option<ConfigFile>,
}

impl ConfigEntry {
    pub fn new(stack_name: &str) -> Self {
        return Self {
            stack_name: Some(stack_name.to_string()),
            region: None,
            description: None,
            parameters: BTreeMap::new(),
            outputs: None,
        };
    }

    pub fn parameters(&self) -> Parameters {
        return self
            .parameters
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|value| (*key, value.render())))
            .collect();
    }

    pub fn stack_props(&self, overrides: &Parameters) -> StackProps {
        let mut parameters = self.parameters();
        for (key, value) in overrides {
            parameters.insert(*key, value.clone());
        }

        return StackProps {
            description: self.description.clone(),
            parameters,
        };
    }
}

pub type Config = Vec<ConfigEntry>;

pub fn default_config() -> Config {
    return vec![ConfigEntry::new(DEFAULT_STACK_ID)];
}

pub fn parse(path: &PathBuf) -> Result<Config, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: Config = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    for config_entry in &config {
        match config_entry.validate() {
            Ok(_) => (),
            Err(error) => return Err(Error::ValidationError(error.to_string())),
        }
    }

    let mut seen: Vec<&String> = vec![];
    for stack_name in config.iter().filter_map(|entry| entry.stack_name.as_ref()) {
        if seen.contains(&stack_name) {
            return Err(Error::ValidationError(format!(
                "stack_name: `{}` is declared more than once",
                stack_name
            )));
        }
        seen.push(stack_name);
    }

    return Ok(config);
}

fn validate_stack_name(stack_name: &str) -> Result<(), ValidationError> {
    if !is_valid_stack_name(stack_name) {
        return Err(ValidationError::new(
            "The stack name has to start with a letter and contain only letters, digits and `-`",
        ));
    }

    return Ok(());
}

fn validate_parameter_values(
    parameters: &BTreeMap<ParameterKey, Option<ParameterValue>>,
) -> Result<(), ValidationError> {
    for (key, value) in parameters {
        let value = match value {
            Some(value) => value,
            None => continue,
        };
        if !is_text(value) {
            let mut error = ValidationError::new("unquoted_parameter");
            error.message = Some(Cow::from(format!(
                "Parameter `{}` has to be a string, quote it to keep it as written (e.g. '{}')",
                key,
                value.render()
            )));
            return Err(error);
        }
    }

    return Ok(());
}

fn is_text(value: &ParameterValue) -> bool {
    return match value {
        ParameterValue::Text(_) => true,
        ParameterValue::List(values) => values.iter().all(is_text),
        ParameterValue::Flag(_) | ParameterValue::Number(_) => false,
    };
}

fn validate_json_file(json_file: &ConfigFile) -> Result<(), ValidationError> {
    let file_extension = match json_file.location.extension() {
        Some(extension) => extension,
        None => {
            return Err(ValidationError::new(
                "Unable to parse the extension of the outputs file location",
            ))
        }
    };
    if file_extension != "json" {
        return Err(ValidationError::new(
            "The outputs file location has to end with `.json`",
        ));
    }

    return Ok(());
}
