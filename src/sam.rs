use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const APPLICATION_RESOURCE_TYPE: &str = "AWS::Serverless::Application";
pub const SERVERLESS_TRANSFORM: &str = "AWS::Serverless-2016-10-31";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("Malformed parameter `{0}`, expected KEY=VALUE")]
    MalformedParameter(String),
}

/// Parameters recognized by the aws-lambda-power-tuning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParameterKey {
    #[serde(rename = "lambdaResource")]
    LambdaResource,
    #[serde(rename = "PowerValues")]
    PowerValues,
    #[serde(rename = "visualizationURL")]
    VisualizationUrl,
    #[serde(rename = "totalExecutionTimeout")]
    TotalExecutionTimeout,
    #[serde(rename = "payloadS3Key")]
    PayloadS3Key,
    #[serde(rename = "payloadS3Bucket")]
    PayloadS3Bucket,
    #[serde(rename = "logGroupRetentionInDays")]
    LogGroupRetentionInDays,
    #[serde(rename = "stateMachineNamePrefix")]
    StateMachineNamePrefix,
    #[serde(rename = "permissionsBoundary")]
    PermissionsBoundary,
    #[serde(rename = "layerSdkName")]
    LayerSdkName,
    #[serde(rename = "securityGroupIds")]
    SecurityGroupIds,
    #[serde(rename = "subnetIds")]
    SubnetIds,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 12] = [
        ParameterKey::LambdaResource,
        ParameterKey::PowerValues,
        ParameterKey::VisualizationUrl,
        ParameterKey::TotalExecutionTimeout,
        ParameterKey::PayloadS3Key,
        ParameterKey::PayloadS3Bucket,
        ParameterKey::LogGroupRetentionInDays,
        ParameterKey::StateMachineNamePrefix,
        ParameterKey::PermissionsBoundary,
        ParameterKey::LayerSdkName,
        ParameterKey::SecurityGroupIds,
        ParameterKey::SubnetIds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::LambdaResource => "lambdaResource",
            ParameterKey::PowerValues => "PowerValues",
            ParameterKey::VisualizationUrl => "visualizationURL",
            ParameterKey::TotalExecutionTimeout => "totalExecutionTimeout",
            ParameterKey::PayloadS3Key => "payloadS3Key",
            ParameterKey::PayloadS3Bucket => "payloadS3Bucket",
            ParameterKey::LogGroupRetentionInDays => "logGroupRetentionInDays",
            ParameterKey::StateMachineNamePrefix => "stateMachineNamePrefix",
            ParameterKey::PermissionsBoundary => "permissionsBoundary",
            ParameterKey::LayerSdkName => "layerSdkName",
            ParameterKey::SecurityGroupIds => "securityGroupIds",
            ParameterKey::SubnetIds => "subnetIds",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match ParameterKey::ALL.iter().find(|key| key.as_str() == value) {
            Some(key) => Ok(*key),
            None => Err(Error::UnknownParameter(value.to_string())),
        }
    }
}

pub type Parameters = BTreeMap<ParameterKey, String>;

/// Parses a `KEY=VALUE` pair. The value is kept verbatim, including any `=`.
pub fn parse_parameter(raw: &str) -> Result<(ParameterKey, String), Error> {
    let (key, value) = match raw.split_once('=') {
        Some(pair) => pair,
        None => return Err(Error::MalformedParameter(raw.to_string())),
    };

    let key = ParameterKey::from_str(key.trim())?;
    return Ok((key, value.to_string()));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationLocation {
    pub application_id: String,
    pub semantic_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnApplicationProps {
    pub location: ApplicationLocation,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: Parameters,
}

/// `AWS::Serverless::Application`, a nested stack created from a published SAR package.
#[derive(Debug, Clone, PartialEq)]
pub struct CfnApplication {
    pub logical_id: String,
    pub props: CfnApplicationProps,
}

impl CfnApplication {
    pub fn new(logical_id: &str, location: ApplicationLocation, parameters: Parameters) -> Self {
        return Self {
            logical_id: logical_id.to_string(),
            props: CfnApplicationProps {
                location,
                parameters,
            },
        };
    }

    pub fn resource_type(&self) -> &'static str {
        return APPLICATION_RESOURCE_TYPE;
    }
}
