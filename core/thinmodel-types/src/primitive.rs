use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in field type markers.
///
/// A field is declared either with one of these or with another entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Number,
    Text,
    Date,
    Collection,
    Object,
}

impl PrimitiveType {
    /// All primitive markers, in declaration order.
    pub const ALL: [PrimitiveType; 6] = [
        Self::Boolean,
        Self::Number,
        Self::Text,
        Self::Date,
        Self::Collection,
        Self::Object,
    ];

    /// Lowercase name used in diagnostics and serialized schemas.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Text => "text",
            Self::Date => "date",
            Self::Collection => "collection",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::UnknownPrimitive(s.to_string()))
    }
}
