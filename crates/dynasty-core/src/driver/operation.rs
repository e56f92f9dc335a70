mod query_sql;
pub use query_sql::QuerySql;

mod raw_sql;
pub use raw_sql::RawSql;

mod transaction;
pub use transaction::Transaction;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Execute a DML statement
    QuerySql(QuerySql),

    /// Execute caller-provided SQL text
    RawSql(RawSql),

    /// Begin, commit or roll back a transaction
    Transaction(Transaction),
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}

impl From<RawSql> for Operation {
    fn from(value: RawSql) -> Self {
        Self::RawSql(value)
    }
}

impl From<Transaction> for Operation {
    fn from(value: Transaction) -> Self {
        Self::Transaction(value)
    }
}
