use super::{ColumnDef, Statement};

use dynasty_core::{schema::db::Column, Result};

/// A statement to add a column to a table.
#[derive(Debug, Clone)]
pub struct AddColumn {
    /// Name of the table to add the column to.
    pub table: String,

    /// Column definition.
    pub column: ColumnDef,
}

impl Statement {
    /// Adds a column to a table that may already hold rows. Not-null columns
    /// are declared with a backfill default.
    pub fn add_column(table: &str, column: &Column) -> Result<Self> {
        let mut def = ColumnDef::from_schema(column);
        def.default = column.backfill_default(table)?;

        Ok(AddColumn {
            table: table.to_string(),
            column: def,
        }
        .into())
    }
}

impl From<AddColumn> for Statement {
    fn from(value: AddColumn) -> Self {
        Self::AddColumn(value)
    }
}
