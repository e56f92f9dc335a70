/// The type of a statement value.
///
/// Every synthesized property maps onto exactly one of these; the database
/// storage type is tracked separately as [`crate::schema::db::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point
    F64,

    /// Fixed-point decimal
    Decimal,

    /// UTF-8 string
    String,

    /// Calendar date without a time zone
    Date,

    /// An instant in time, stored in UTC
    Timestamp,

    /// Raw bytes
    Bytes,

    /// The null type. Only `Value::Null` has it.
    Null,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Bool => "Bool",
            Type::I32 => "I32",
            Type::I64 => "I64",
            Type::F64 => "F64",
            Type::Decimal => "Decimal",
            Type::String => "String",
            Type::Date => "Date",
            Type::Timestamp => "Timestamp",
            Type::Bytes => "Bytes",
            Type::Null => "Null",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::I32 | Type::I64 | Type::F64 | Type::Decimal)
    }
}
