//! Argument validation shared by every store operation
//!
//! IDs must be positive integers and type tags must be recognized. Checks run
//! in a fixed order (left id, right id, left type, right type) and the first
//! failure aborts the whole call before any storage access.

use crate::object_type::TypeRegistry;
use crate::{Error, ObjectId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;

/// Parameter of a store operation, with its 1-based position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    LeftObjectId,
    LeftObjectType,
    RightObjectType,
    RightObjectId,
    /// The single object id taken by `related_ids`
    ObjectId,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::LeftObjectId => "left_object_id",
            Param::LeftObjectType => "left_object_type",
            Param::RightObjectType => "right_object_type",
            Param::RightObjectId => "right_object_id",
            Param::ObjectId => "object_id",
        }
    }

    pub fn position(&self) -> u8 {
        match self {
            Param::LeftObjectId | Param::ObjectId => 1,
            Param::LeftObjectType => 2,
            Param::RightObjectType => 3,
            Param::RightObjectId => 4,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of value was supplied where a positive integer id was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Zero,
    Negative,
    OutOfRange,
    String,
    Float,
    Object,
    Array,
    Boolean,
    Null,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Zero => "zero",
            InputKind::Negative => "negative integer",
            InputKind::OutOfRange => "out-of-range integer",
            InputKind::String => "string",
            InputKind::Float => "float",
            InputKind::Object => "object",
            InputKind::Array => "array",
            InputKind::Boolean => "boolean",
            InputKind::Null => "null",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value that may be used as an object id.
///
/// Conversion classifies bad input into an [`InputKind`] once, at the
/// boundary, from the argument's own type.
pub trait IdArg {
    fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind>;
}

fn positive(n: i64) -> std::result::Result<ObjectId, InputKind> {
    match n {
        0 => Err(InputKind::Zero),
        n if n < 0 => Err(InputKind::Negative),
        n => Ok(n),
    }
}

macro_rules! signed_id_arg {
    ($($t:ty),*) => {$(
        impl IdArg for $t {
            fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
                positive(i64::from(*self))
            }
        }
    )*};
}

macro_rules! fallible_id_arg {
    ($($t:ty),*) => {$(
        impl IdArg for $t {
            fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
                i64::try_from(*self)
                    .map_err(|_| InputKind::OutOfRange)
                    .and_then(positive)
            }
        }
    )*};
}

signed_id_arg!(i8, i16, i32, i64);
fallible_id_arg!(u8, u16, u32, u64, usize, isize);

/// Decimal integer strings are accepted.
///
/// Surrounding whitespace and one leading sign are allowed; leading zeros
/// (`"05"`) are not. Anything else is a `String` diagnostic.
impl IdArg for str {
    fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
        let trimmed = self.trim();
        let digits = trimmed.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(trimmed);
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(InputKind::String);
        }

        match trimmed.parse::<i64>() {
            Ok(n) => positive(n),
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                Err(InputKind::OutOfRange)
            }
            Err(_) => Err(InputKind::String),
        }
    }
}

impl IdArg for String {
    fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
        self.as_str().to_object_id()
    }
}

impl IdArg for serde_json::Value {
    fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
        use serde_json::Value;
        match self {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    positive(i)
                } else if n.is_u64() {
                    Err(InputKind::OutOfRange)
                } else {
                    Err(InputKind::Float)
                }
            }
            Value::String(s) => s.to_object_id(),
            Value::Object(_) => Err(InputKind::Object),
            Value::Array(_) => Err(InputKind::Array),
            Value::Bool(_) => Err(InputKind::Boolean),
            Value::Null => Err(InputKind::Null),
        }
    }
}

impl<T: IdArg + ?Sized> IdArg for &T {
    fn to_object_id(&self) -> std::result::Result<ObjectId, InputKind> {
        (**self).to_object_id()
    }
}

/// Validated arguments of `exists`, `create` and `delete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairArgs {
    pub left_id: ObjectId,
    pub left_type: String,
    pub right_type: String,
    pub right_id: ObjectId,
}

/// Validated arguments of `related_ids`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupArgs {
    pub object_id: ObjectId,
    pub left_type: String,
    pub right_type: String,
}

fn check_id(param: Param, value: &impl IdArg) -> Result<ObjectId> {
    value
        .to_object_id()
        .map_err(|kind| Error::InvalidObjectId { param, kind })
}

fn check_type(param: Param, recognized: &[String], value: &str) -> Result<String> {
    if recognized.iter().any(|t| t == value) {
        Ok(value.to_string())
    } else {
        Err(Error::InvalidObjectType {
            param,
            allowed: recognized.to_vec(),
            given: value.to_string(),
        })
    }
}

/// Validate the four arguments of a pair operation
pub fn validate_pair(
    types: &TypeRegistry,
    left_id: impl IdArg,
    left_type: &str,
    right_type: &str,
    right_id: impl IdArg,
) -> Result<PairArgs> {
    let left_id = check_id(Param::LeftObjectId, &left_id)?;
    let right_id = check_id(Param::RightObjectId, &right_id)?;

    let recognized = types.recognized();
    let left_type = check_type(Param::LeftObjectType, &recognized, left_type)?;
    let right_type = check_type(Param::RightObjectType, &recognized, right_type)?;

    Ok(PairArgs {
        left_id,
        left_type,
        right_type,
        right_id,
    })
}

/// Validate the arguments of a directional lookup
pub fn validate_lookup(
    types: &TypeRegistry,
    object_id: impl IdArg,
    left_type: &str,
    right_type: &str,
) -> Result<LookupArgs> {
    let object_id = check_id(Param::ObjectId, &object_id)?;

    let recognized = types.recognized();
    let left_type = check_type(Param::LeftObjectType, &recognized, left_type)?;
    let right_type = check_type(Param::RightObjectType, &recognized, right_type)?;

    Ok(LookupArgs {
        object_id,
        left_type,
        right_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_kinds() {
        assert_eq!(5i64.to_object_id(), Ok(5));
        assert_eq!(0i32.to_object_id(), Err(InputKind::Zero));
        assert_eq!((-1i32).to_object_id(), Err(InputKind::Negative));
        assert_eq!(u64::MAX.to_object_id(), Err(InputKind::OutOfRange));
        assert_eq!("42".to_object_id(), Ok(42));
        assert_eq!("abc".to_object_id(), Err(InputKind::String));
        assert_eq!("0".to_object_id(), Err(InputKind::Zero));
    }

    #[test]
    fn test_string_id_forms() {
        assert_eq!(" 12 ".to_object_id(), Ok(12));
        assert_eq!("+5".to_object_id(), Ok(5));
        assert_eq!("05".to_object_id(), Err(InputKind::String));
        assert_eq!("+05".to_object_id(), Err(InputKind::String));
        assert_eq!("00".to_object_id(), Err(InputKind::String));
        assert_eq!("-0".to_object_id(), Err(InputKind::Zero));
        assert_eq!("-3".to_object_id(), Err(InputKind::Negative));
        assert_eq!("99999999999999999999".to_object_id(), Err(InputKind::OutOfRange));
        assert_eq!("".to_object_id(), Err(InputKind::String));
    }

    #[test]
    fn test_json_id_kinds() {
        assert_eq!(json!(7).to_object_id(), Ok(7));
        assert_eq!(json!(1.5).to_object_id(), Err(InputKind::Float));
        assert_eq!(json!({"id": 1}).to_object_id(), Err(InputKind::Object));
        assert_eq!(json!([1]).to_object_id(), Err(InputKind::Array));
        assert_eq!(json!(true).to_object_id(), Err(InputKind::Boolean));
        assert_eq!(json!(null).to_object_id(), Err(InputKind::Null));
        assert_eq!(json!("9").to_object_id(), Ok(9));
    }

    #[test]
    fn test_left_id_checked_first() {
        let types = TypeRegistry::new();
        let err = validate_pair(&types, -1, "bogus", "user", 0).unwrap_err();
        match err {
            Error::InvalidObjectId { param, kind } => {
                assert_eq!(param, Param::LeftObjectId);
                assert_eq!(param.position(), 1);
                assert_eq!(kind, InputKind::Negative);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ids_checked_before_types() {
        let types = TypeRegistry::new();
        let err = validate_pair(&types, 1, "bogus", "user", "x").unwrap_err();
        assert_eq!(err.param(), Some(Param::RightObjectId));
    }

    #[test]
    fn test_unknown_type_lists_allowed_set() {
        let types = TypeRegistry::new();
        let err = validate_pair(&types, 1, "bogus_type", "user", 5).unwrap_err();
        match &err {
            Error::InvalidObjectType { param, allowed, given } => {
                assert_eq!(*param, Param::LeftObjectType);
                assert_eq!(given, "bogus_type");
                assert!(allowed.iter().any(|t| t == "post"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("parameter 2"));
        assert!(message.contains("comment, post, page, taxonomy, user"));
    }

    #[test]
    fn test_lookup_validation() {
        let types = TypeRegistry::new();
        let args = validate_lookup(&types, "3", "post", "user").unwrap();
        assert_eq!(args.object_id, 3);

        let err = validate_lookup(&types, 0, "post", "user").unwrap_err();
        assert_eq!(err.param(), Some(Param::ObjectId));

        let err = validate_lookup(&types, 3, "post", "nope").unwrap_err();
        assert_eq!(err.param(), Some(Param::RightObjectType));
    }
}
