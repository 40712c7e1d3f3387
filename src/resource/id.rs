//! Identifiers used as URL path segments

use std::fmt;

use serde_json::Value;

/// An object id or path rendered as a single URL segment.
///
/// GitLab accepts both numeric ids and full paths (`group/project`, file paths
/// such as `docs/README.md`). Paths must be sent with every reserved character
/// percent-encoded, `/` included, so `Display` always renders the encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The id as given, before encoding
    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }

    /// Read an id out of a JSON attribute (string or number)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// JSON form of the id: a number when it is one, a string otherwise
    pub fn to_value(&self) -> Value {
        self.0
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(self.0.clone()))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&urlencoding::encode(&self.0))
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for ResourceId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<&ResourceId> for ResourceId {
    fn from(value: &ResourceId) -> Self {
        value.clone()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for ResourceId {
            fn from(value: $t) -> Self {
                Self(value.to_string())
            }
        })*
    };
}

impl_from_int!(u32, u64, i32, i64, usize);
