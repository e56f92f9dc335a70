mod add_column;
pub use add_column::AddColumn;

mod column_def;
pub use column_def::ColumnDef;

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

pub use dynasty_core::stmt::*;

#[derive(Debug, Clone)]
pub enum Statement {
    AddColumn(AddColumn),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    Delete(Delete),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::AddColumn(_) | Statement::CreateIndex(_) | Statement::CreateTable(_)
        )
    }

    /// Number of columns each returned row carries, if the statement returns
    /// rows.
    pub fn returning_len(&self) -> Option<usize> {
        match self {
            Statement::Select(select) => Some(select.columns.len()),
            Statement::Insert(insert) if !insert.returning.is_empty() => {
                Some(insert.returning.len())
            }
            _ => None,
        }
    }
}

impl From<dynasty_core::stmt::Statement> for Statement {
    fn from(value: dynasty_core::stmt::Statement) -> Self {
        match value {
            dynasty_core::stmt::Statement::Delete(stmt) => Statement::Delete(stmt),
            dynasty_core::stmt::Statement::Insert(stmt) => Statement::Insert(stmt),
            dynasty_core::stmt::Statement::Select(stmt) => Statement::Select(stmt),
            dynasty_core::stmt::Statement::Update(stmt) => Statement::Update(stmt),
        }
    }
}
