/// SQL text passed through to the database unchanged.
#[derive(Debug, Clone)]
pub struct RawSql {
    pub sql: String,

    /// When set, returned rows are read back; otherwise only the affected row
    /// count is returned.
    pub query: bool,
}
