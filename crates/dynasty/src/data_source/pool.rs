//! Connection pooling for data sources.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    time::Duration,
};

use deadpool::managed::{self, PoolError, RecycleError};
use dynasty_core::{
    driver::{operation::Transaction, Driver},
    Connection, Error,
};

/// Get the default maximum size of a pool, which is `cpu_core_count * 2`
/// including logical cores (Hyper-Threading).
fn get_default_pool_max_size() -> usize {
    managed::PoolConfig::default().max_size
}

/// The connection pool of one configured data source.
///
/// Every pool carries an id unique within its manager, so a connection can be
/// traced back to the pool that handed it out.
#[derive(Debug)]
pub(crate) struct Pool {
    inner: managed::Pool<Manager>,
    id: u64,
    name: String,
    timeout: Duration,
}

impl Pool {
    /// Builds a pool and opens one connection to prove the driver works.
    pub(crate) async fn open(
        id: u64,
        name: &str,
        driver: Box<dyn Driver>,
        size: Option<usize>,
        timeout: Duration,
    ) -> dynasty_core::Result<Pool> {
        let mut max_size = size.unwrap_or_else(get_default_pool_max_size);
        if let Some(max_connections) = driver.max_connections() {
            max_size = max_size.min(max_connections);
        }

        if max_size == 0 {
            return Err(Error::invalid_driver_configuration(
                "pool size must be at least 1",
            ));
        }

        let inner = managed::Pool::builder(Manager { driver })
            .max_size(max_size)
            .wait_timeout(Some(timeout))
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(Error::connection_pool)?;

        let pool = Pool {
            inner,
            id,
            name: name.to_string(),
            timeout,
        };

        pool.get().await?.ping().await?;

        tracing::debug!(config = name, pool = id, max_size, "pool opened");
        Ok(pool)
    }

    /// Checks out a connection, waiting up to the checkout timeout.
    pub(crate) async fn get(&self) -> dynasty_core::Result<PooledConnection> {
        match self.inner.get().await {
            Ok(inner) => {
                tracing::debug!(config = %self.name, pool = self.id, "connection checked out");
                Ok(PooledConnection {
                    inner,
                    pool_id: self.id,
                })
            }
            Err(PoolError::Timeout(_)) => Err(Error::pool_exhausted(&self.name, self.timeout)),
            Err(PoolError::Backend(err)) => Err(err),
            Err(PoolError::Closed) => Err(Error::not_configured(&self.name)),
            Err(err) => Err(dynasty_core::err!(
                "connection pool for `{}` failed: {err}",
                self.name
            )),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn driver(&self) -> &dyn Driver {
        &*self.inner.manager().driver
    }

    /// Closes the pool. Idle connections are dropped now, checked out ones
    /// when they come back.
    pub(crate) fn close(&self) {
        self.inner.close();
        tracing::debug!(config = %self.name, pool = self.id, "pool closed");
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

impl managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        obj: &mut Self::Type,
        _metrics: &managed::Metrics,
    ) -> managed::RecycleResult<Self::Error> {
        if obj.in_transaction() {
            tracing::debug!("rolling back a transaction left open on a returned connection");
            obj.exec(Transaction::Rollback.into())
                .await
                .map_err(RecycleError::Backend)?;
        }
        obj.ping().await.map_err(RecycleError::Backend)
    }
}

/// A connection checked out of a data source's pool.
///
/// Hand it back with
/// [`DataSourceManager::restore_connection`](super::DataSourceManager::restore_connection).
/// Dropping it also returns it to the pool it came from.
pub struct PooledConnection {
    inner: managed::Object<Manager>,
    pool_id: u64,
}

impl PooledConnection {
    pub(crate) fn pool_id(&self) -> u64 {
        self.pool_id
    }
}

impl Deref for PooledConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("pool_id", &self.pool_id)
            .field("connection", &**self.inner)
            .finish()
    }
}
