use crate::stmt;

/// Semantic type of a descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,

    /// 32-bit integer
    Integer,

    /// 64-bit integer
    Long,

    Double,

    /// Fixed-point decimal, sized by the field's precision and scale
    Decimal,

    /// Text, optionally bounded by the field's length
    String,

    Date,

    Timestamp,

    Blob,
}

impl DataType {
    /// The statement type values of this field carry.
    pub fn ty(self) -> stmt::Type {
        match self {
            DataType::Boolean => stmt::Type::Bool,
            DataType::Integer => stmt::Type::I32,
            DataType::Long => stmt::Type::I64,
            DataType::Double => stmt::Type::F64,
            DataType::Decimal => stmt::Type::Decimal,
            DataType::String => stmt::Type::String,
            DataType::Date => stmt::Type::Date,
            DataType::Timestamp => stmt::Type::Timestamp,
            DataType::Blob => stmt::Type::Bytes,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, DataType::Integer | DataType::Long)
    }
}
