use serde_json::Value;
use std::collections::BTreeMap;

use crate::template::Template;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Template has no resource of type {0}")]
    NoResources(String),

    #[error("No {resource_type} resource matches the expected properties:\n{mismatches}")]
    NoMatch {
        resource_type: String,
        mismatches: String,
    },

    #[error("Expected {expected} resource(s) of type {resource_type}, found {actual}")]
    CountMismatch {
        resource_type: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Mismatch {
    path: String,
    expected: Value,
    actual: Option<Value>,
}

impl Template {
    pub fn find_resources(&self, resource_type: &str) -> BTreeMap<String, Value> {
        return self
            .resources()
            .into_iter()
            .filter(|(_, resource)| resource.get("Type").and_then(Value::as_str) == Some(resource_type))
            .collect();
    }

    pub fn resource_count_is(&self, resource_type: &str, expected: usize) -> Result<(), Error> {
        let actual = self.find_resources(resource_type).len();
        if actual != expected {
            return Err(Error::CountMismatch {
                resource_type: resource_type.to_string(),
                expected,
                actual,
            });
        }

        return Ok(());
    }

    /// Passes when at least one resource of `resource_type` has properties that
    /// contain `expected`. Objects are compared key by key, anything else by equality.
    pub fn has_resource_properties(&self, resource_type: &str, expected: Value) -> Result<(), Error> {
        let resources = self.find_resources(resource_type);
        if resources.is_empty() {
            return Err(Error::NoResources(resource_type.to_string()));
        }

        let mut mismatches = vec![];
        for (logical_id, resource) in &resources {
            let properties = resource.get("Properties").cloned().unwrap_or(Value::Object(Default::default()));
            match object_like(&expected, &properties, String::new()) {
                None => return Ok(()),
                Some(mismatch) => mismatches.push(format_mismatch(logical_id, &mismatch)),
            }
        }

        return Err(Error::NoMatch {
            resource_type: resource_type.to_string(),
            mismatches: mismatches.join("\n"),
        });
    }
}

fn object_like(expected: &Value, actual: &Value, path: String) -> Option<Mismatch> {
    match (expected, actual) {
        (Value::Object(expected_fields), Value::Object(actual_fields)) => {
            for (key, expected_value) in expected_fields {
                let field_path = format!("{}/{}", path, key);
                match actual_fields.get(key) {
                    Some(actual_value) => {
                        if let Some(mismatch) = object_like(expected_value, actual_value, field_path) {
                            return Some(mismatch);
                        }
                    }
                    None => {
                        return Some(Mismatch {
                            path: field_path,
                            expected: expected_value.clone(),
                            actual: None,
                        })
                    }
                }
            }
            None
        }
        _ if expected == actual => None,
        _ => Some(Mismatch {
            path,
            expected: expected.clone(),
            actual: Some(actual.clone()),
        }),
    }
}

fn format_mismatch(logical_id: &str, mismatch: &Mismatch) -> String {
    let path = if mismatch.path.is_empty() { "/" } else { &mismatch.path };
    match &mismatch.actual {
        Some(actual) => format!(
            "  {}: at {} expected {} but got {}",
            logical_id, path, mismatch.expected, actual
        ),
        None => format!(
            "  {}: at {} expected {} but the key is missing",
            logical_id, path, mismatch.expected
        ),
    }
}
