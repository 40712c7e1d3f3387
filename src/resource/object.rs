//! Generic in-memory resource

use serde_json::Value;

use super::attrs::RequiredOptional;
use super::id::ResourceId;
use super::Attrs;
use crate::error::{GitlabError, Result};

/// Attributes of a server-side entity.
///
/// `attrs` mirror the last server response; `updated` holds local changes
/// that have not been saved yet. Reads see local changes first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestObject {
    attrs: Attrs,
    updated: Attrs,
    id_attr: Option<&'static str>,
}

impl RestObject {
    pub fn new(attrs: Attrs, id_attr: Option<&'static str>) -> Self {
        Self {
            attrs,
            updated: Attrs::new(),
            id_attr,
        }
    }

    /// Build from a server response, which must be a JSON object
    pub fn from_value(value: Value, id_attr: Option<&'static str>) -> Result<Self> {
        match value {
            Value::Object(attrs) => Ok(Self::new(attrs, id_attr)),
            other => Err(GitlabError::Parsing(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.updated.get(key).or_else(|| self.attrs.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Record a local change, sent on the next save
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.updated.insert(key.into(), value.into());
    }

    pub fn id_attr(&self) -> Option<&'static str> {
        self.id_attr
    }

    pub fn id(&self) -> Option<ResourceId> {
        self.id_attr
            .and_then(|key| self.get(key))
            .and_then(ResourceId::from_value)
    }

    /// Id of the object, failing when the resource has none
    pub fn require_id(&self) -> Result<ResourceId> {
        self.id().ok_or_else(|| {
            GitlabError::MissingAttributes(vec![self.id_attr.unwrap_or("id").to_string()])
        })
    }

    /// Attributes from the last server response
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Local changes pending a save
    pub fn updated_attrs(&self) -> &Attrs {
        &self.updated
    }

    pub fn is_dirty(&self) -> bool {
        !self.updated.is_empty()
    }

    /// Merge a server response and drop local changes
    pub fn apply(&mut self, server: Attrs) {
        self.attrs.extend(server);
        self.updated.clear();
    }

    /// Payload for an update: every required attribute, then every local change
    pub fn updated_data(&self, contract: &RequiredOptional) -> Attrs {
        let mut data = Attrs::new();
        for key in contract.required {
            if let Some(value) = self.get(key) {
                data.insert(key.to_string(), value.clone());
            }
        }
        data.extend(self.updated.clone());
        data
    }

    /// Current view of the object, local changes included
    pub fn to_value(&self) -> Value {
        let mut merged = self.attrs.clone();
        merged.extend(self.updated.clone());
        Value::Object(merged)
    }
}
