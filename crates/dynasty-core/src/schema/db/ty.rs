use crate::{driver, schema::FieldDescriptor, stmt, Error, Result};

use super::super::DataType;

/// Database storage type of a column, as it appears in DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A boolean value
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// Double precision floating point
    Double,

    /// Decimal number with optional precision and scale.
    Numeric(Option<(u32, u32)>),

    /// Unconstrained text type
    Text,

    /// Text type with an explicit maximum length
    VarChar(u64),

    /// Unconstrained binary type
    Blob,

    /// A civil date
    Date,

    /// An instant in time
    Timestamp,

    /// Declared type that does not map onto any of the above
    Custom(String),
}

impl Type {
    /// Maps a descriptor field onto the storage type used for its column.
    pub fn from_field(field: &FieldDescriptor, db: &driver::StorageTypes) -> Result<Type> {
        let ty = match field.data_type {
            DataType::Boolean => Type::Boolean,
            DataType::Integer => Type::Integer(4),
            DataType::Long => Type::Integer(8),
            DataType::Double => Type::Double,
            DataType::Decimal => Type::Numeric(
                field
                    .precision
                    .map(|precision| (precision, field.scale.unwrap_or(0))),
            ),
            DataType::String => match field.length {
                Some(length) => Type::VarChar(length as u64),
                None => db.default_string_type.clone(),
            },
            DataType::Date => Type::Date,
            DataType::Timestamp => Type::Timestamp,
            DataType::Blob => Type::Blob,
        };

        ty.verify(db)?;
        Ok(ty)
    }

    /// The statement type closest to this storage type, used when a live
    /// column is introspected without a descriptor.
    pub fn bridge_type(&self) -> stmt::Type {
        match self {
            Type::Boolean => stmt::Type::Bool,
            Type::Integer(n) if *n <= 4 => stmt::Type::I32,
            Type::Integer(_) => stmt::Type::I64,
            Type::Double => stmt::Type::F64,
            Type::Numeric(_) => stmt::Type::Decimal,
            Type::Text | Type::VarChar(_) | Type::Custom(_) => stmt::Type::String,
            Type::Blob => stmt::Type::Bytes,
            Type::Date => stmt::Type::Date,
            Type::Timestamp => stmt::Type::Timestamp,
        }
    }

    fn verify(&self, db: &driver::StorageTypes) -> Result<()> {
        match *self {
            Type::VarChar(size) => match db.varchar {
                Some(max) if size > max => Err(Error::unsupported_feature(format!(
                    "VARCHAR({}) exceeds database maximum of {}",
                    size, max
                ))),
                None => Err(Error::unsupported_feature(
                    "VARCHAR type is not supported by this database",
                )),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}
