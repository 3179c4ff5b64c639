use aws_config::meta::region::RegionProviderChain;
use aws_sdk_cloudformation::model::{Output, StackResource};
use aws_types::region::Region;
use log::{debug, info};
use std::collections::BTreeMap;

use crate::config::ConfigEntry;
use crate::stack::POWER_TUNER_LOGICAL_ID;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Service error ocurred: {0}.")]
    ServiceError(String),

    #[error("Unknown error ocurred: {0}.")]
    UnknownError(String),

    #[error("Stack not found: {0}")]
    NotFoundError(String),

    #[error("Stack {0} has no {1} resource, is it deployed?")]
    NestedStackNotFound(String, String),

    #[error("Stack name is missing")]
    MissingStackName,

    #[error("Unable to resolve an AWS region")]
    MissingRegion,
}

/// Read-only view of a deployed power tuner stack.
pub struct PowerTunerOutputs {
    pub stack_name: String,

    client: aws_sdk_cloudformation::Client,
}

impl PowerTunerOutputs {
    pub async fn new(config_entry: &ConfigEntry) -> Result<Self, Error> {
        let stack_name = match config_entry.stack_name.as_ref() {
            Some(stack_name) => stack_name.clone(),
            None => return Err(Error::MissingStackName),
        };

        let region = match config_entry.region.as_ref() {
            Some(provided_region) => Region::new(provided_region.clone()),
            None => match RegionProviderChain::default_provider().region().await {
                Some(region) => region,
                None => return Err(Error::MissingRegion),
            },
        };
        debug!("Using region {} for stack {}", region, stack_name);

        let sdk_config = aws_config::from_env().region(region).load().await;
        let client = aws_sdk_cloudformation::Client::new(&sdk_config);

        return Ok(Self { stack_name, client });
    }

    /// Outputs of the nested stack the SAR application was deployed as.
    pub async fn fetch(&self) -> Result<BTreeMap<String, String>, Error> {
        let nested_stack_id = self.nested_stack_id().await?;
        info!(
            "Found {} nested stack {}",
            POWER_TUNER_LOGICAL_ID, nested_stack_id
        );

        let outputs = self.get_outputs(&nested_stack_id).await?;
        return Ok(collect_outputs(&outputs));
    }

    async fn nested_stack_id(&self) -> Result<String, Error> {
        let result = self
            .client
            .describe_stack_resources()
            .stack_name(&self.stack_name)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(aws_sdk_cloudformation::types::SdkError::ServiceError { err, .. }) => {
                return Err(Error::ServiceError(err.to_string()));
            }
            Err(err) => return Err(Error::UnknownError(err.to_string())),
        };

        let resources = result.stack_resources().unwrap_or_else(|| &[]);
        match find_nested_stack(resources, POWER_TUNER_LOGICAL_ID) {
            Some(physical_id) => Ok(physical_id),
            None => Err(Error::NestedStackNotFound(
                self.stack_name.clone(),
                String::from(POWER_TUNER_LOGICAL_ID),
            )),
        }
    }

    async fn get_outputs(&self, stack_name: &str) -> Result<Vec<Output>, Error> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(aws_sdk_cloudformation::types::SdkError::ServiceError { err, .. }) => {
                return Err(Error::ServiceError(err.to_string()));
            }
            Err(err) => return Err(Error::UnknownError(err.to_string())),
        };

        let stacks = result.stacks().unwrap_or_else(|| &[]);
        let outputs = match stacks.first() {
            Some(stack) => stack.outputs().unwrap_or_else(|| &[]).to_vec(),
            None => return Err(Error::NotFoundError(stack_name.to_string())),
        };

        return Ok(outputs);
    }
}

fn find_nested_stack(resources: &[StackResource], logical_id: &str) -> Option<String> {
    return resources
        .iter()
        .find(|resource| resource.logical_resource_id() == Some(logical_id))
        .and_then(|resource| resource.physical_resource_id())
        .map(String::from);
}

fn collect_outputs(outputs: &[Output]) -> BTreeMap<String, String> {
    return outputs
        .iter()
        .filter_map(|output| match (output.output_key(), output.output_value()) {
            (Some(key), Some(value)) => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect();
}
