mod introspect;

mod value;
pub(crate) use value::Value;

use dynasty_core::{
    async_trait,
    driver::{
        operation::{Operation, Transaction},
        Capability, Driver, Response,
    },
    schema::db::{Migration, Table, TableDiff},
    stmt, Error, Result,
};
use dynasty_sql as sql;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use url::Url;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),

    /// A private in-memory database shared by every connection this driver
    /// opens. The anchor connection keeps it alive for the driver's lifetime.
    InMemory {
        uri: String,
        anchor: Mutex<Option<RusqliteConnection>>,
    },
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| {
            Error::invalid_connection_url(format!("{err}; url={url_str}"))
        })?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={}",
                url_str
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::in_memory())
        } else if url.path().is_empty() {
            Err(Error::invalid_connection_url(format!(
                "connection URL has no database path; url={url_str}"
            )))
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory {
            uri: format!(
                "file:dynasty-{}?mode=memory&cache=shared",
                uuid::Uuid::new_v4().simple()
            ),
            anchor: Mutex::new(None),
        }
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    fn open_connection(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory { uri, anchor } => {
                let mut anchor = anchor
                    .lock()
                    .map_err(|_| dynasty_core::err!("in-memory database anchor poisoned"))?;
                if anchor.is_none() {
                    *anchor = Some(open_uri(uri)?);
                }
                Ok(Connection {
                    connection: open_uri(uri)?,
                })
            }
        }
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory { .. } => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn dynasty_core::Connection>> {
        Ok(Box::new(self.open_connection()?))
    }

    fn max_connections(&self) -> Option<usize> {
        // Shared-cache connections fail with SQLITE_LOCKED instead of waiting.
        matches!(self, Sqlite::InMemory { .. }).then_some(1)
    }

    fn generate_migration(&self, diff: &TableDiff<'_>) -> Result<Migration> {
        let statements = sql::MigrationStatement::from_diff(diff)?;

        let mut sql_strings = Vec::with_capacity(statements.len());
        for statement in &statements {
            let mut params = Vec::<stmt::Value>::new();
            let sql = sql::Serializer::sqlite().serialize(statement.statement(), &mut params);
            if !params.is_empty() {
                return Err(Error::schema_migration(
                    statement_table(statement.statement()),
                    "migration statements should not have parameters",
                ));
            }
            sql_strings.push(sql);
        }

        Ok(Migration::new_sql_with_breakpoints(&sql_strings))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection =
            RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "exec");
        self.connection
            .execute_batch(sql)
            .map_err(Error::driver_operation_failed)
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
        width: usize,
        ret: Option<&[stmt::Type]>,
    ) -> Result<Response> {
        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(Error::driver_operation_failed)?;

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)?;

        let mut ret_rows = vec![];

        while let Some(row) = rows.next().map_err(Error::driver_operation_failed)? {
            let mut items = Vec::with_capacity(width);

            for index in 0..width {
                let ty = ret.and_then(|ret| ret.get(index)).copied();
                items.push(Value::from_sql(row, index, ty)?.into_inner());
            }

            ret_rows.push(stmt::ValueRecord::from_vec(items));
        }

        Ok(Response::values(ret_rows))
    }
}

#[async_trait]
impl dynasty_core::Connection for Connection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        let (sql, ret): (sql::Statement, _) = match op {
            Operation::QuerySql(op) => (op.stmt.into(), op.ret),
            Operation::RawSql(op) => {
                tracing::debug!(sql = %op.sql, query = op.query, "exec raw");
                if op.query {
                    let width = self
                        .connection
                        .prepare_cached(&op.sql)
                        .map_err(Error::driver_operation_failed)?
                        .column_count();
                    return self.query(&op.sql, &[], width, None);
                }
                let count = self
                    .connection
                    .execute(&op.sql, [])
                    .map_err(Error::driver_operation_failed)?;
                return Ok(Response::count(count as _));
            }
            Operation::Transaction(Transaction::Start) => {
                self.execute_batch("BEGIN IMMEDIATE")?;
                return Ok(Response::count(0));
            }
            Operation::Transaction(Transaction::Commit) => {
                self.execute_batch("COMMIT")?;
                return Ok(Response::count(0));
            }
            Operation::Transaction(Transaction::Rollback) => {
                self.execute_batch("ROLLBACK")?;
                return Ok(Response::count(0));
            }
        };

        let mut params: Vec<stmt::Value> = vec![];
        let sql_str = sql::Serializer::sqlite().serialize(&sql, &mut params);
        tracing::debug!(sql = %sql_str, params = params.len(), "exec");

        let params = params.into_iter().map(Value::from).collect::<Vec<_>>();

        match sql.returning_len() {
            Some(width) => self.query(&sql_str, &params, width, ret.as_deref()),
            None => {
                let mut stmt = self
                    .connection
                    .prepare_cached(&sql_str)
                    .map_err(Error::driver_operation_failed)?;

                let count = stmt
                    .execute(rusqlite::params_from_iter(params.iter()))
                    .map_err(Error::driver_operation_failed)?;

                Ok(Response::count(count as _))
            }
        }
    }

    async fn describe_table(&mut self, table: &str) -> Result<Option<Table>> {
        introspect::describe_table(&self.connection, table)
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        introspect::list_tables(&self.connection)
    }

    fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }

    async fn apply_migration(&mut self, migration: &Migration) -> Result<()> {
        self.execute_batch("BEGIN IMMEDIATE")?;

        for statement in migration.statements() {
            if let Err(err) = self.execute_batch(statement) {
                self.execute_batch("ROLLBACK")?;
                return Err(err);
            }
        }

        self.execute_batch("COMMIT")
    }
}

fn open_uri(uri: &str) -> Result<RusqliteConnection> {
    let connection = RusqliteConnection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(Error::driver_operation_failed)?;

    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(Error::driver_operation_failed)?;

    Ok(connection)
}

fn statement_table(statement: &sql::Statement) -> &str {
    match statement {
        sql::Statement::AddColumn(stmt) => &stmt.table,
        sql::Statement::CreateIndex(stmt) => &stmt.on,
        sql::Statement::CreateTable(stmt) => &stmt.name,
        sql::Statement::Delete(stmt) => &stmt.table,
        sql::Statement::Insert(stmt) => &stmt.table,
        sql::Statement::Select(stmt) => &stmt.source.name,
        sql::Statement::Update(stmt) => &stmt.table,
    }
}
