use super::Type;
use crate::{Error, Result};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::str::FromStr;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit floating point
    F64(f64),

    /// Fixed-point decimal
    Decimal(Decimal),

    /// String value
    String(String),

    /// Calendar date
    Date(NaiveDate),

    /// UTC instant
    Timestamp(DateTime<Utc>),

    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn infer_ty(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::F64(_) => Type::F64,
            Value::Decimal(_) => Type::Decimal,
            Value::String(_) => Type::String,
            Value::Date(_) => Type::Date,
            Value::Timestamp(_) => Type::Timestamp,
            Value::Bytes(_) => Type::Bytes,
        }
    }

    /// Converts the value to `ty` without losing information.
    ///
    /// Null casts to every type. Integers widen, and values read back from
    /// loosely typed storage (integers for booleans, text for dates and
    /// decimals) are accepted when they parse.
    pub fn cast(self, ty: Type) -> Result<Value> {
        if self.is_null() || self.infer_ty() == ty {
            return Ok(self);
        }

        let cast = match (self, ty) {
            (Value::I32(v), Type::I64) => Value::I64(v as i64),
            (Value::I32(v), Type::F64) => Value::F64(v as f64),
            (Value::I32(v), Type::Decimal) => Value::Decimal(Decimal::from(v)),
            (Value::I64(v), Type::I32) => match i32::try_from(v) {
                Ok(v) => Value::I32(v),
                Err(_) => return Err(Error::type_conversion(Value::I64(v), ty.name())),
            },
            (Value::I64(v), Type::F64) => Value::F64(v as f64),
            (Value::I64(v), Type::Decimal) => Value::Decimal(Decimal::from(v)),
            (Value::I64(v), Type::Bool) if v == 0 || v == 1 => Value::Bool(v == 1),
            (Value::I32(v), Type::Bool) if v == 0 || v == 1 => Value::Bool(v == 1),
            (Value::F64(v), Type::Decimal) => match Decimal::try_from(v) {
                Ok(d) => Value::Decimal(d),
                Err(_) => return Err(Error::type_conversion(Value::F64(v), ty.name())),
            },
            (Value::Decimal(v), Type::F64) => match v.to_f64() {
                Some(f) => Value::F64(f),
                None => return Err(Error::type_conversion(Value::Decimal(v), ty.name())),
            },
            (Value::String(s), Type::Decimal) => Value::Decimal(Decimal::from_str(&s)?),
            (Value::String(s), Type::Date) => {
                Value::Date(NaiveDate::parse_from_str(&s, "%Y-%m-%d")?)
            }
            (Value::String(s), Type::Timestamp) => {
                Value::Timestamp(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc))
            }
            (value, ty) => return Err(Error::type_conversion(value, ty.name())),
        };

        Ok(cast)
    }

    pub fn to_bool(self) -> Result<bool> {
        match self.cast(Type::Bool)? {
            Value::Bool(v) => Ok(v),
            value => Err(Error::type_conversion(value, "bool")),
        }
    }

    pub fn to_i64(self) -> Result<i64> {
        match self.cast(Type::I64)? {
            Value::I64(v) => Ok(v),
            value => Err(Error::type_conversion(value, "i64")),
        }
    }

    pub fn to_string(self) -> Result<String> {
        match self {
            Value::String(v) => Ok(v),
            value => Err(Error::type_conversion(value, "String")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            Value::I32(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match *self {
            Value::Decimal(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I32(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<Decimal> for Value {
    fn from(src: Decimal) -> Self {
        Self::Decimal(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(src: NaiveDate) -> Self {
        Self::Date(src)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(src: DateTime<Utc>) -> Self {
        Self::Timestamp(src)
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Value::from(value),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_casts_to_anything() {
        for ty in [Type::Bool, Type::Date, Type::Decimal, Type::Bytes] {
            assert_eq!(Value::Null.cast(ty).unwrap(), Value::Null);
        }
    }

    #[test]
    fn integers_widen() {
        assert_eq!(Value::I32(7).cast(Type::I64).unwrap(), Value::I64(7));
        assert_eq!(
            Value::I32(7).cast(Type::Decimal).unwrap(),
            Value::Decimal(Decimal::from(7))
        );
        assert_eq!(Value::I64(3).cast(Type::F64).unwrap(), Value::F64(3.0));
    }

    #[test]
    fn narrowing_out_of_range_fails() {
        let err = Value::I64(i64::MAX).cast(Type::I32).unwrap_err();
        assert!(err.is_type_conversion());
        assert_eq!(Value::I64(12).cast(Type::I32).unwrap(), Value::I32(12));
    }

    #[test]
    fn storage_representations_parse() {
        assert_eq!(Value::I64(0).cast(Type::Bool).unwrap(), Value::Bool(false));
        assert_eq!(
            Value::from("2024-02-29").cast(Type::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            Value::from("12.50").cast(Type::Decimal).unwrap(),
            Value::Decimal(Decimal::new(1250, 2))
        );
    }

    #[test]
    fn incompatible_types_fail() {
        let err = Value::Bool(true).cast(Type::String).unwrap_err();
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert Bool to String");

        assert!(Value::I64(2).cast(Type::Bool).is_err());
    }
}
