use super::Type;
use crate::{stmt, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The name of the column in the database.
    pub name: String,

    /// The column type, from the record's point of view.
    pub ty: stmt::Type,

    /// The database storage type of the column.
    pub storage_ty: Type,

    /// Whether or not the column is nullable
    pub nullable: bool,

    /// True if the column is the table's primary key
    pub primary_key: bool,

    /// True if the column is an integer that should be auto-incremented
    /// with each insertion of a new row.
    pub auto_increment: bool,

    /// Declared `DEFAULT`
    pub default: Option<stmt::Value>,

    /// Foreign key target, declared inline when the table is created
    pub references: Option<ColumnRef>,
}

/// The column a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl Column {
    /// The `DEFAULT` to declare when this column is added to a table that may
    /// already hold rows.
    ///
    /// Nullable columns and columns with a declared default use what they
    /// declare. Not-null columns without one get the zero value of their
    /// type so existing rows stay valid; date and time columns have no zero
    /// value and are rejected.
    pub fn backfill_default(&self, table: &str) -> Result<Option<stmt::Value>> {
        if self.nullable || self.default.is_some() {
            return Ok(self.default.clone());
        }

        let value = match self.ty {
            stmt::Type::Bool => stmt::Value::Bool(false),
            stmt::Type::I32 => stmt::Value::I32(0),
            stmt::Type::I64 => stmt::Value::I64(0),
            stmt::Type::F64 => stmt::Value::F64(0.0),
            stmt::Type::Decimal => stmt::Value::Decimal(Default::default()),
            stmt::Type::String => stmt::Value::String(String::new()),
            stmt::Type::Bytes => stmt::Value::Bytes(vec![]),
            stmt::Type::Date | stmt::Type::Timestamp | stmt::Type::Null => {
                return Err(Error::schema_migration(
                    table,
                    format!(
                        "not-null column `{}` cannot be added without a default",
                        self.name
                    ),
                ))
            }
        };

        Ok(Some(value))
    }
}
