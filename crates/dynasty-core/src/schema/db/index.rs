/// A secondary index or uniqueness group on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,

    /// Indexed column names, in key order
    pub columns: Vec<String>,

    pub unique: bool,
}
