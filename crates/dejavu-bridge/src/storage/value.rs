use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::{ParseFloatError, ParseIntError};

use ordered_float::NotNan;
#[cfg(feature = "serde")]
use serde::Serialize;

/// The tokens that coerce to `true` when a boolean parameter is requested, compared case-insensitively.
pub const TRUE_TOKENS: [&str; 5] = ["true", "t", "yes", "y", "1"];

/**
The general type for holding all kinds of event arguments and shared variables.
*/
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Value {
    /**
    Expresses the absence of a value.
    */
    None,
    /**
    A boolean value.
    */
    Bool(bool),
    /**
    An unsigned integer with 64 bits.
    */
    Unsigned(u64),
    /**
    A signed integer with 64 bits.
    */
    Signed(i64),
    /**
    A double-precision floating-point number that is not NaN.
    */
    Float(NotNan<f64>),
    /**
    A string that must be utf-8 encoded.
    */
    Str(Box<str>),
}

/// The declared type of a handler parameter.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// The value is passed through unchanged.
    Any,
    #[allow(missing_docs)]
    Bool,
    #[allow(missing_docs)]
    Signed,
    #[allow(missing_docs)]
    Unsigned,
    #[allow(missing_docs)]
    Float,
    #[allow(missing_docs)]
    Str,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => write!(f, "Any"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Signed => write!(f, "signed integer"),
            ValueType::Unsigned => write!(f, "unsigned integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Str => write!(f, "string"),
        }
    }
}

/// Describes why a [Value] could not be converted into a [ValueType].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueConvertError {
    /// The string representation is not an integer.
    ParseInt(ParseIntError),
    /// The string representation is not a float.
    ParseFloat(ParseFloatError),
    /// The conversion would produce NaN.
    NotANumber,
    /// The number does not fit into the target type.
    OutOfRange(String),
    /// There is no conversion from this kind of value into the target type.
    Incompatible(&'static str),
}

impl Display for ValueConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueConvertError::ParseInt(e) => write!(f, "{}", e),
            ValueConvertError::ParseFloat(e) => write!(f, "{}", e),
            ValueConvertError::NotANumber => write!(f, "value is not a number"),
            ValueConvertError::OutOfRange(v) => write!(f, "{} is out of range for the target type", v),
            ValueConvertError::Incompatible(kind) => write!(f, "a {} value cannot be converted", kind),
        }
    }
}

impl Error for ValueConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValueConvertError::ParseInt(e) => Some(e),
            ValueConvertError::ParseFloat(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", *b),
            Value::Unsigned(u) => write!(f, "{}", *u),
            Value::Signed(s) => write!(f, "{}", *s),
            Value::Float(fl) => write!(f, "{}", *fl),
            Value::Str(str) => write!(f, "{}", *str),
        }
    }
}

impl Value {
    /// Returns the name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Unsigned(_) => "unsigned integer",
            Value::Signed(_) => "signed integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Renders the value as a token of a handler result line.
    /// Identical to the [Display] form except that floats are truncated to their integer part.
    pub fn to_result_token(&self) -> String {
        match self {
            Value::Float(fl) => {
                let truncated = fl.trunc();
                if truncated == 0.0 {
                    "0".to_string()
                } else {
                    format!("{:.0}", truncated)
                }
            },
            other => other.to_string(),
        }
    }

    /// Converts the value into the given type.
    ///
    /// Booleans are decided by membership in [TRUE_TOKENS], never by a numeric conversion.
    pub fn coerce(self, ty: ValueType) -> Result<Value, ValueConvertError> {
        match ty {
            ValueType::Any => Ok(self),
            ValueType::Bool => Ok(Value::Bool(self.is_true_token())),
            ValueType::Signed => self.to_signed().map(Value::Signed),
            ValueType::Unsigned => self.to_unsigned().map(Value::Unsigned),
            ValueType::Float => self.to_float().map(Value::Float),
            ValueType::Str => {
                match self {
                    Value::Str(s) => Ok(Value::Str(s)),
                    other => Ok(Value::Str(other.to_string().into())),
                }
            },
        }
    }

    fn is_true_token(&self) -> bool {
        let token = self.to_string().to_lowercase();
        TRUE_TOKENS.contains(&token.as_str())
    }

    fn to_signed(&self) -> Result<i64, ValueConvertError> {
        match self {
            Value::Signed(s) => Ok(*s),
            Value::Unsigned(u) => i64::try_from(*u).map_err(|_| ValueConvertError::OutOfRange(u.to_string())),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Float(fl) => {
                let truncated = fl.trunc();
                // 2^63 is exactly representable, i64::MAX is not
                if truncated >= i64::MIN as f64 && truncated < 9_223_372_036_854_775_808.0 {
                    Ok(truncated as i64)
                } else {
                    Err(ValueConvertError::OutOfRange(fl.to_string()))
                }
            },
            Value::Str(s) => s.trim().parse::<i64>().map_err(ValueConvertError::ParseInt),
            Value::None => Err(ValueConvertError::Incompatible(self.kind())),
        }
    }

    fn to_unsigned(&self) -> Result<u64, ValueConvertError> {
        match self {
            Value::Unsigned(u) => Ok(*u),
            Value::Signed(s) => u64::try_from(*s).map_err(|_| ValueConvertError::OutOfRange(s.to_string())),
            Value::Bool(b) => Ok(u64::from(*b)),
            Value::Float(fl) => {
                let truncated = fl.trunc();
                if truncated >= 0.0 && truncated < 18_446_744_073_709_551_616.0 {
                    Ok(truncated as u64)
                } else {
                    Err(ValueConvertError::OutOfRange(fl.to_string()))
                }
            },
            Value::Str(s) => s.trim().parse::<u64>().map_err(ValueConvertError::ParseInt),
            Value::None => Err(ValueConvertError::Incompatible(self.kind())),
        }
    }

    fn to_float(&self) -> Result<NotNan<f64>, ValueConvertError> {
        let f = match self {
            Value::Float(fl) => return Ok(*fl),
            Value::Signed(s) => *s as f64,
            Value::Unsigned(u) => *u as f64,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Str(s) => s.trim().parse::<f64>().map_err(ValueConvertError::ParseFloat)?,
            Value::None => return Err(ValueConvertError::Incompatible(self.kind())),
        };
        NotNan::new(f).map_err(|_| ValueConvertError::NotANumber)
    }

    /// Returns the boolean if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => Option::None,
        }
    }

    /// Returns the string slice if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => Option::None,
        }
    }

    /// Decides if a value is `None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

// Implement From for Value

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Signed(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Signed(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Unsigned(u)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Unsigned(u64::from(u))
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::Unsigned(u as u64)
    }
}

/// NaN has no representation and becomes [Value::None].
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        NotNan::new(f).map(Value::Float).unwrap_or(Value::None)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into_boxed_str())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.as_str().into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::None)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn size_of_value() {
        let result = std::mem::size_of::<Value>();
        let expected = 24;
        assert!(
            result == expected,
            "Size of `Value` should be {} bytes, was `{}`",
            expected,
            result
        );
    }

    #[test]
    fn bool_coercion_is_case_insensitive() {
        for raw in ["true", "TRUE", "True", "t", "Y", "yes", "1"] {
            assert_eq!(Value::from(raw).coerce(ValueType::Bool), Ok(Value::Bool(true)), "{raw}");
        }
        for raw in ["false", "0", "no", "", "truthy"] {
            assert_eq!(Value::from(raw).coerce(ValueType::Bool), Ok(Value::Bool(false)), "{raw}");
        }
        assert_eq!(Value::Bool(true).coerce(ValueType::Bool), Ok(Value::Bool(true)));
        assert_eq!(Value::Signed(1).coerce(ValueType::Bool), Ok(Value::Bool(true)));
        assert_eq!(Value::Signed(2).coerce(ValueType::Bool), Ok(Value::Bool(false)));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::from("42").coerce(ValueType::Signed), Ok(Value::Signed(42)));
        assert_eq!(Value::from(" -7 ").coerce(ValueType::Signed), Ok(Value::Signed(-7)));
        assert_eq!(Value::from("10").coerce(ValueType::Unsigned), Ok(Value::Unsigned(10)));
        assert_eq!(Value::from(2.9).coerce(ValueType::Signed), Ok(Value::Signed(2)));
        assert_eq!(Value::Signed(3).coerce(ValueType::Float), Ok(Value::from(3.0)));
        assert_eq!(Value::Bool(true).coerce(ValueType::Signed), Ok(Value::Signed(1)));
        assert!(matches!(
            Value::from("abc").coerce(ValueType::Signed),
            Err(ValueConvertError::ParseInt(_))
        ));
        assert!(matches!(
            Value::Signed(-1).coerce(ValueType::Unsigned),
            Err(ValueConvertError::OutOfRange(_))
        ));
        assert!(matches!(
            Value::from("NaN").coerce(ValueType::Float),
            Err(ValueConvertError::NotANumber)
        ));
        assert!(matches!(
            Value::None.coerce(ValueType::Signed),
            Err(ValueConvertError::Incompatible("None"))
        ));
    }

    #[test]
    fn any_passes_through() {
        let v = Value::from("untouched");
        assert_eq!(v.clone().coerce(ValueType::Any), Ok(v));
        assert_eq!(Value::None.coerce(ValueType::Any), Ok(Value::None));
    }

    #[test]
    fn result_tokens_truncate_floats() {
        assert_eq!(Value::from(5.0).to_result_token(), "5");
        assert_eq!(Value::from(2.75).to_result_token(), "2");
        assert_eq!(Value::from(-2.75).to_result_token(), "-2");
        assert_eq!(Value::from(-0.25).to_result_token(), "0");
        assert_eq!(Value::from(2.75).to_string(), "2.75");
        assert_eq!(Value::Bool(false).to_result_token(), "false");
    }

    #[test]
    fn nan_becomes_none() {
        assert_eq!(Value::from(f64::NAN), Value::None);
    }
}
