//! Preference values and their type tags.
//!
//! Every value stored by prefkit is one of a closed set of primitives. The
//! [`PreferenceKind`] tag travels with the value so backends and handlers
//! can dispatch without inspecting the value at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// KIND
// ============================================================================

/// Type tag for a stored preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Int,
    Long,
    Float,
    Double,
    String,
    Bool,
}

impl PreferenceKind {
    /// All kinds, in tag order.
    pub const ALL: [PreferenceKind; 6] = [
        PreferenceKind::Int,
        PreferenceKind::Long,
        PreferenceKind::Float,
        PreferenceKind::Double,
        PreferenceKind::String,
        PreferenceKind::Bool,
    ];

    /// Single-byte tag used by binary backends.
    pub fn tag(self) -> u8 {
        match self {
            PreferenceKind::Int => 1,
            PreferenceKind::Long => 2,
            PreferenceKind::Float => 3,
            PreferenceKind::Double => 4,
            PreferenceKind::String => 5,
            PreferenceKind::Bool => 6,
        }
    }

    /// Inverse of [`PreferenceKind::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKind::Int => "int",
            PreferenceKind::Long => "long",
            PreferenceKind::Float => "float",
            PreferenceKind::Double => "double",
            PreferenceKind::String => "string",
            PreferenceKind::Bool => "bool",
        }
    }

    /// Parse a textual representation into a value of this kind.
    ///
    /// Used by the CLI and by configuration-driven defaults.
    pub fn parse_value(self, raw: &str) -> Option<PreferenceValue> {
        match self {
            PreferenceKind::Int => raw.trim().parse().ok().map(PreferenceValue::Int),
            PreferenceKind::Long => raw.trim().parse().ok().map(PreferenceValue::Long),
            PreferenceKind::Float => raw.trim().parse().ok().map(PreferenceValue::Float),
            PreferenceKind::Double => raw.trim().parse().ok().map(PreferenceValue::Double),
            PreferenceKind::String => Some(PreferenceValue::String(raw.to_string())),
            PreferenceKind::Bool => raw.trim().parse().ok().map(PreferenceValue::Bool),
        }
    }
}

impl fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "i32" => Ok(PreferenceKind::Int),
            "long" | "i64" => Ok(PreferenceKind::Long),
            "float" | "f32" => Ok(PreferenceKind::Float),
            "double" | "f64" => Ok(PreferenceKind::Double),
            "string" | "str" => Ok(PreferenceKind::String),
            "bool" | "boolean" => Ok(PreferenceKind::Bool),
            other => Err(format!("unknown preference kind: {}", other)),
        }
    }
}

// ============================================================================
// VALUE
// ============================================================================

/// A stored preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PreferenceValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bool(bool),
}

impl PreferenceValue {
    /// The type tag of this value.
    pub fn kind(&self) -> PreferenceKind {
        match self {
            PreferenceValue::Int(_) => PreferenceKind::Int,
            PreferenceValue::Long(_) => PreferenceKind::Long,
            PreferenceValue::Float(_) => PreferenceKind::Float,
            PreferenceValue::Double(_) => PreferenceKind::Double,
            PreferenceValue::String(_) => PreferenceKind::String,
            PreferenceValue::Bool(_) => PreferenceKind::Bool,
        }
    }

    /// Approximate heap + inline footprint, used for cache statistics.
    pub fn size_hint(&self) -> usize {
        match self {
            PreferenceValue::Int(_) | PreferenceValue::Float(_) => 4,
            PreferenceValue::Long(_) | PreferenceValue::Double(_) => 8,
            PreferenceValue::Bool(_) => 1,
            PreferenceValue::String(s) => s.len(),
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::Int(v) => write!(f, "{}", v),
            PreferenceValue::Long(v) => write!(f, "{}", v),
            PreferenceValue::Float(v) => write!(f, "{}", v),
            PreferenceValue::Double(v) => write!(f, "{}", v),
            PreferenceValue::String(v) => f.write_str(v),
            PreferenceValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// PREFERENCE TRAIT
// ============================================================================

/// A Rust type that can be stored directly as a preference.
///
/// Implemented for the six primitive kinds. Anything else goes through a
/// serialization strategy and is stored as a string.
pub trait Preference: Clone + PartialEq + Send + Sync + 'static {
    /// The kind this type is stored under.
    const KIND: PreferenceKind;

    /// Wrap into a [`PreferenceValue`].
    fn into_value(self) -> PreferenceValue;

    /// Unwrap from a [`PreferenceValue`]. Returns `None` on kind mismatch.
    fn from_value(value: PreferenceValue) -> Option<Self>;
}

macro_rules! impl_preference {
    ($ty:ty, $variant:ident) => {
        impl Preference for $ty {
            const KIND: PreferenceKind = PreferenceKind::$variant;

            fn into_value(self) -> PreferenceValue {
                PreferenceValue::$variant(self)
            }

            fn from_value(value: PreferenceValue) -> Option<Self> {
                match value {
                    PreferenceValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for PreferenceValue {
            fn from(value: $ty) -> Self {
                PreferenceValue::$variant(value)
            }
        }
    };
}

impl_preference!(i32, Int);
impl_preference!(i64, Long);
impl_preference!(f32, Float);
impl_preference!(f64, Double);
impl_preference!(String, String);
impl_preference!(bool, Bool);

impl From<&str> for PreferenceValue {
    fn from(value: &str) -> Self {
        PreferenceValue::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip_covers_all_kinds() {
        for kind in PreferenceKind::ALL {
            assert_eq!(PreferenceKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(PreferenceKind::from_tag(0), None);
        assert_eq!(PreferenceKind::from_tag(42), None);
    }

    #[test]
    fn test_value_reports_kind() {
        assert_eq!(PreferenceValue::Int(1).kind(), PreferenceKind::Int);
        assert_eq!(PreferenceValue::Long(1).kind(), PreferenceKind::Long);
        assert_eq!(PreferenceValue::Float(1.0).kind(), PreferenceKind::Float);
        assert_eq!(PreferenceValue::Double(1.0).kind(), PreferenceKind::Double);
        assert_eq!(PreferenceValue::from("x").kind(), PreferenceKind::String);
        assert_eq!(PreferenceValue::Bool(true).kind(), PreferenceKind::Bool);
    }

    #[test]
    fn test_from_value_rejects_other_kinds() {
        assert_eq!(i32::from_value(PreferenceValue::Int(7)), Some(7));
        assert_eq!(i32::from_value(PreferenceValue::Long(7)), None);
        assert_eq!(bool::from_value(PreferenceValue::String("true".into())), None);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            PreferenceKind::Int.parse_value(" 42 "),
            Some(PreferenceValue::Int(42))
        );
        assert_eq!(PreferenceKind::Bool.parse_value("yes"), None);
        assert_eq!(
            PreferenceKind::String.parse_value(" keep spaces "),
            Some(PreferenceValue::String(" keep spaces ".into()))
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Boolean".parse::<PreferenceKind>(), Ok(PreferenceKind::Bool));
        assert_eq!("f64".parse::<PreferenceKind>(), Ok(PreferenceKind::Double));
        assert!("uuid".parse::<PreferenceKind>().is_err());
    }

    #[test]
    fn test_value_json_shape() {
        let json = serde_json::to_value(PreferenceValue::Int(3)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "int", "value": 3}));
    }
}
