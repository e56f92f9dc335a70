mod capability;
pub use capability::{Capability, StorageTypes};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{
    async_trait,
    schema::db::{Migration, Table, TableDiff},
    Result,
};

use std::{borrow::Cow, fmt::Debug};

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// The connection URL this driver opens.
    fn url(&self) -> Cow<'_, str>;

    /// Describes the driver's capability, which informs DDL generation.
    fn capability(&self) -> &'static Capability;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// An upper bound on the pool size imposed by the database, if any.
    fn max_connections(&self) -> Option<usize> {
        None
    }

    /// Plans the DDL that brings a live table in line with a diff.
    fn generate_migration(&self, diff: &TableDiff<'_>) -> Result<Migration>;
}

#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> Result<Response>;

    /// Reads the live definition of `table`, or `None` if it does not exist.
    async fn describe_table(&mut self, table: &str) -> Result<Option<Table>>;

    /// Names of all user tables.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Applies every statement of `migration` in one transaction.
    async fn apply_migration(&mut self, migration: &Migration) -> Result<()>;

    /// Whether a transaction was started and not yet committed or rolled back.
    fn in_transaction(&self) -> bool {
        false
    }

    /// Checks that the connection is usable.
    async fn ping(&mut self) -> Result<()> {
        self.exec(Operation::RawSql(operation::RawSql {
            sql: "SELECT 1".to_string(),
            query: true,
        }))
        .await
        .map(|_| ())
    }
}
