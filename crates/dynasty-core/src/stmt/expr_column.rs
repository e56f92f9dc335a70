use super::Expr;

/// A column reference. `table` holds the alias of the source the column is
/// read from, when the statement joins more than one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprColumn {
    pub table: Option<String>,
    pub name: String,
}

impl ExprColumn {
    pub fn new(table: Option<String>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }
}

impl From<ExprColumn> for Expr {
    fn from(value: ExprColumn) -> Self {
        Self::Column(value)
    }
}
