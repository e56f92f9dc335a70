use dynasty_core::{schema::db::TableDiff, Result};

use crate::stmt::Statement;

/// One DDL statement planned from a table diff.
#[derive(Debug, Clone)]
pub struct MigrationStatement {
    statement: Statement,
}

impl MigrationStatement {
    /// Plans the statements that bring a live table in line with `diff`.
    ///
    /// A new table is created together with its indices. An existing table
    /// only gains columns and indices; nothing is dropped or altered.
    pub fn from_diff(diff: &TableDiff<'_>) -> Result<Vec<Self>> {
        let mut result = vec![];

        match diff {
            TableDiff::CreateTable(table) => {
                result.push(Statement::create_table(table));
                for index in &table.indices {
                    result.push(Statement::create_index(&table.name, index));
                }
            }
            TableDiff::AlterTable {
                table,
                add_columns,
                add_indices,
                ..
            } => {
                for column in add_columns {
                    result.push(Statement::add_column(&table.name, column)?);
                }
                for index in add_indices {
                    result.push(Statement::create_index(&table.name, index));
                }
            }
            TableDiff::Unchanged { .. } => {}
        }

        Ok(result
            .into_iter()
            .map(|statement| MigrationStatement { statement })
            .collect())
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
}
