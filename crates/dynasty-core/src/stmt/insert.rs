use super::Expr;

/// A single-row `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Expr>,

    /// Columns to return from the inserted row
    pub returning: Vec<String>,
}
