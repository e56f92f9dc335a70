use crate::stmt::ValueRecord;

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Returned rows
    Values(Vec<ValueRecord>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(values: Vec<ValueRecord>) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Rows::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Rows::Values(_))
    }

    /// Rows affected, or rows returned for a query.
    pub fn count(&self) -> u64 {
        match self {
            Rows::Count(count) => *count,
            Rows::Values(values) => values.len() as u64,
        }
    }

    pub fn into_values(self) -> Vec<ValueRecord> {
        match self {
            Rows::Values(values) => values,
            Rows::Count(_) => vec![],
        }
    }
}
