use crate::stmt;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The statement to execute
    pub stmt: stmt::Statement,

    /// Types of the returned columns. `None` when the statement returns only
    /// a row count.
    pub ret: Option<Vec<stmt::Type>>,
}

impl QuerySql {
    pub fn new(stmt: impl Into<stmt::Statement>, ret: Option<Vec<stmt::Type>>) -> Self {
        Self {
            stmt: stmt.into(),
            ret,
        }
    }
}
