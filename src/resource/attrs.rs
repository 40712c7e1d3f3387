//! Required/optional attribute contracts for create and update calls

use serde::Serialize;
use serde_json::Value;

use super::Attrs;
use crate::error::{GitlabError, Result};

/// Attributes a create or update call accepts.
///
/// Only `required` and `exclusive` are enforced. Optional and unknown keys are
/// forwarded to the server untouched, which keeps the bindings usable when
/// GitLab grows new parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredOptional {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Exactly one of these must be present, when non-empty
    pub exclusive: &'static [&'static str],
}

impl RequiredOptional {
    pub const NONE: Self = Self::new(&[], &[]);

    pub const fn new(required: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self {
            required,
            optional,
            exclusive: &[],
        }
    }

    /// Check `data` against the contract, ignoring required keys listed in `excludes`
    pub fn validate(&self, data: &Attrs, excludes: &[&str]) -> Result<()> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|key| !excludes.contains(*key) && !data.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GitlabError::MissingAttributes(missing));
        }

        if !self.exclusive.is_empty() {
            let present: Vec<String> = data
                .keys()
                .filter(|key| self.exclusive.contains(&key.as_str()))
                .cloned()
                .collect();
            match present.len() {
                1 => {}
                0 => {
                    return Err(GitlabError::ExclusiveAttributes(
                        self.exclusive.iter().map(|k| k.to_string()).collect(),
                    ))
                }
                _ => return Err(GitlabError::ExclusiveAttributes(present)),
            }
        }

        Ok(())
    }

    /// Whether `key` is part of the contract at all
    pub fn accepts(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key) || self.exclusive.contains(&key)
    }
}

/// Serialize any struct or map into an attribute map
pub fn to_attrs<T: Serialize + ?Sized>(value: &T) -> Result<Attrs> {
    match serde_json::to_value(value).map_err(|e| GitlabError::Parsing(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Attrs::new()),
        other => Err(GitlabError::Parsing(format!(
            "expected an object of attributes, got {other}"
        ))),
    }
}

/// Interpret a server response as an attribute map; an empty body is an empty map
pub fn into_attrs(value: Value) -> Result<Attrs> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Attrs::new()),
        other => Err(GitlabError::Parsing(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
