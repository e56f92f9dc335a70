use super::{connect, DataSourceConfig, Pool, PooledConnection};
use crate::reconcile::{reconcile_all, ReconcileReport};

use dynasty_core::{
    driver::operation::RawSql,
    schema::db::Column,
    stmt::ValueRecord,
    EntityDescriptor, Error, Result,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Owns the named data sources of a process and their connection pools.
///
/// Operations on one name are serialized by that name's lock; different
/// names never wait on each other. Cloning yields another handle to the same
/// manager.
#[derive(Debug, Clone, Default)]
pub struct DataSourceManager {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Held only to find or create a slot, never across an await.
    slots: parking_lot::Mutex<HashMap<String, Arc<Slot>>>,
    next_pool_id: AtomicU64,
}

#[derive(Debug, Default)]
struct Slot {
    /// Id of the live pool, or 0 when the name is not configured. Lets a
    /// connection be checked against its pool without taking the lock.
    pool_id: AtomicU64,
    state: tokio::sync::Mutex<Option<Configured>>,
}

#[derive(Debug)]
struct Configured {
    config: DataSourceConfig,
    pool: Arc<Pool>,
}

impl DataSourceManager {
    pub fn new() -> DataSourceManager {
        DataSourceManager::default()
    }

    /// Opens a pool for `config` and, if the configuration manages its
    /// schema, reconciles every entity table.
    ///
    /// Fails if the name is already configured. On any failure nothing is
    /// registered.
    pub async fn configure(&self, config: DataSourceConfig) -> Result<()> {
        let slot = self.slot_or_insert(config.name());
        let mut state = slot.state.lock().await;

        if state.is_some() {
            return Err(Error::already_configured(config.name()));
        }

        let pool = match self.open(&config).await {
            Ok(pool) => pool,
            Err(err) => {
                self.forget_if_idle(config.name(), &slot);
                return Err(err);
            }
        };
        slot.pool_id.store(pool.id(), Ordering::Release);

        tracing::info!(
            config = config.name(),
            url = config.url(),
            entities = config.entity_descriptors().len(),
            "data source configured"
        );

        *state = Some(Configured {
            config,
            pool: Arc::new(pool),
        });
        Ok(())
    }

    /// Replaces the pool of a configured name with one built from `config`.
    ///
    /// Returns `false`, changing nothing, if the name is not configured. The
    /// old pool is closed once the new one is ready; its checked out
    /// connections can no longer be restored and are dropped when released.
    pub async fn reconfigure(&self, config: DataSourceConfig) -> Result<bool> {
        let Some(slot) = self.slot(config.name()) else {
            return Ok(false);
        };
        let mut state = slot.state.lock().await;

        if state.is_none() {
            return Ok(false);
        }

        let pool = self.open(&config).await?;
        slot.pool_id.store(pool.id(), Ordering::Release);

        let previous = state.replace(Configured {
            config,
            pool: Arc::new(pool),
        });
        if let Some(previous) = previous {
            previous.pool.close();
            tracing::info!(config = previous.config.name(), "data source reconfigured");
        }

        Ok(true)
    }

    /// Opens and closes one connection for `config` without registering
    /// anything.
    pub async fn test_configuration(&self, config: &DataSourceConfig) -> Result<()> {
        let driver = connect::driver(config)?;
        let mut connection = driver.connect().await?;
        connection.ping().await?;
        tracing::debug!(config = config.name(), "configuration tested");
        Ok(())
    }

    /// Checks out a connection, waiting up to the configured timeout when the
    /// pool is exhausted.
    pub async fn get_connection(&self, name: &str) -> Result<PooledConnection> {
        let pool = {
            let slot = self.slot(name).ok_or_else(|| Error::not_configured(name))?;
            let state = slot.state.lock().await;
            state
                .as_ref()
                .map(|configured| configured.pool.clone())
                .ok_or_else(|| Error::not_configured(name))?
        };

        pool.get().await
    }

    /// Returns a connection to the pool of `name`.
    ///
    /// A connection from another data source, or from a pool this name has
    /// since replaced, is rejected; it still goes back to its own pool.
    pub fn restore_connection(&self, name: &str, connection: PooledConnection) -> Result<()> {
        let slot = self.slot(name).ok_or_else(|| Error::not_configured(name))?;

        if slot.pool_id.load(Ordering::Acquire) != connection.pool_id() {
            return Err(Error::foreign_connection(name));
        }

        tracing::debug!(config = name, pool = connection.pool_id(), "connection restored");
        drop(connection);
        Ok(())
    }

    /// Closes the pool of `name` and forgets its configuration. The name can
    /// then be configured again.
    pub async fn terminate_configuration(&self, name: &str) -> Result<()> {
        let slot = self.slot(name).ok_or_else(|| Error::not_configured(name))?;
        let mut state = slot.state.lock().await;

        let configured = state.take().ok_or_else(|| Error::not_configured(name))?;
        slot.pool_id.store(0, Ordering::Release);
        configured.pool.close();
        self.forget_if_idle(name, &slot);

        tracing::info!(config = name, "data source terminated");
        Ok(())
    }

    /// Terminates every configured data source, returning how many there
    /// were.
    pub async fn terminate_all(&self) -> usize {
        let slots: Vec<(String, Arc<Slot>)> = self
            .inner
            .slots
            .lock()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect();

        let mut terminated = 0;
        for (name, slot) in slots {
            let mut state = slot.state.lock().await;
            if let Some(configured) = state.take() {
                slot.pool_id.store(0, Ordering::Release);
                configured.pool.close();
                tracing::info!(config = %name, "data source terminated");
                terminated += 1;
            }
            self.forget_if_idle(&name, &slot);
        }
        terminated
    }

    /// Reconciles the tables of `descriptors` against the data source `name`
    /// and records them as its entities.
    ///
    /// Holds the name's lock for the duration, so configuration changes for
    /// the same name wait for the DDL to finish. Unchanged descriptors are
    /// no-ops.
    pub async fn create_or_update_data_source_dynamic_entity_schema_objects(
        &self,
        name: &str,
        descriptors: &[EntityDescriptor],
    ) -> Result<Vec<ReconcileReport>> {
        let slot = self.slot(name).ok_or_else(|| Error::not_configured(name))?;
        let mut state = slot.state.lock().await;
        let configured = state.as_mut().ok_or_else(|| Error::not_configured(name))?;

        let mut connection = configured.pool.get().await?;
        let reports =
            reconcile_all(configured.pool.driver(), &mut **connection, descriptors).await?;
        drop(connection);

        configured.config.merge_entities(descriptors);
        Ok(reports)
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.slot(name)
            .is_some_and(|slot| slot.pool_id.load(Ordering::Acquire) != 0)
    }

    /// Number of currently configured data sources.
    pub fn data_source_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .values()
            .filter(|slot| slot.pool_id.load(Ordering::Acquire) != 0)
            .count()
    }

    /// The configuration `name` is running with.
    pub async fn configuration(&self, name: &str) -> Result<DataSourceConfig> {
        let slot = self.slot(name).ok_or_else(|| Error::not_configured(name))?;
        let state = slot.state.lock().await;
        state
            .as_ref()
            .map(|configured| configured.config.clone())
            .ok_or_else(|| Error::not_configured(name))
    }

    /// Names of the tables in the data source `name`.
    pub async fn tables(&self, name: &str) -> Result<Vec<String>> {
        let mut connection = self.get_connection(name).await?;
        let tables = connection.list_tables().await;
        self.release(name, connection);
        tables
    }

    /// Live columns of `table`, empty if the table does not exist.
    pub async fn columns(&self, name: &str, table: &str) -> Result<Vec<Column>> {
        let mut connection = self.get_connection(name).await?;
        let described = connection.describe_table(table).await;
        self.release(name, connection);
        Ok(described?.map(|table| table.columns).unwrap_or_default())
    }

    /// Runs `sql` on a throw-away connection for `config` and returns its
    /// rows.
    pub async fn test_native_query(
        &self,
        config: &DataSourceConfig,
        sql: &str,
    ) -> Result<Vec<ValueRecord>> {
        let driver = connect::driver(config)?;
        let mut connection = driver.connect().await?;
        let response = connection
            .exec(
                RawSql {
                    sql: sql.to_string(),
                    query: true,
                }
                .into(),
            )
            .await?;
        Ok(response.rows.into_values())
    }

    /// Runs `sql` on a throw-away connection for `config` and returns the
    /// number of rows it changed.
    pub async fn test_native_update(&self, config: &DataSourceConfig, sql: &str) -> Result<u64> {
        let driver = connect::driver(config)?;
        let mut connection = driver.connect().await?;
        let response = connection
            .exec(
                RawSql {
                    sql: sql.to_string(),
                    query: false,
                }
                .into(),
            )
            .await?;
        Ok(response.rows.count())
    }

    /// Restores `connection`, dropping it if its pool has been replaced.
    pub(crate) fn release(&self, name: &str, connection: PooledConnection) {
        if let Err(err) = self.restore_connection(name, connection) {
            tracing::debug!(config = name, error = %err, "connection dropped instead of restored");
        }
    }

    /// Opens the pool for `config` and reconciles its entities. The pool is
    /// closed again if reconciling fails.
    async fn open(&self, config: &DataSourceConfig) -> Result<Pool> {
        let driver = connect::driver(config)?;
        let id = self.inner.next_pool_id.fetch_add(1, Ordering::Relaxed) + 1;

        let pool = Pool::open(
            id,
            config.name(),
            driver,
            config.pool_size_limit(),
            config.timeout(),
        )
        .await?;

        if config.manages_schema() && !config.entity_descriptors().is_empty() {
            let result = async {
                let mut connection = pool.get().await?;
                reconcile_all(pool.driver(), &mut **connection, config.entity_descriptors()).await
            }
            .await;

            if let Err(err) = result {
                pool.close();
                return Err(err);
            }
        }

        Ok(pool)
    }

    fn slot(&self, name: &str) -> Option<Arc<Slot>> {
        self.inner.slots.lock().get(name).cloned()
    }

    /// Drops the map entry for `name` if `slot` is it and nobody but the map
    /// and the caller holds it. Call with the slot's state lock held and the
    /// state empty.
    fn forget_if_idle(&self, name: &str, slot: &Arc<Slot>) {
        let mut slots = self.inner.slots.lock();
        let idle = slots
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(name);
        }
    }

    fn slot_or_insert(&self, name: &str) -> Arc<Slot> {
        self.inner
            .slots
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_count(manager: &DataSourceManager) -> usize {
        manager.inner.slots.lock().len()
    }

    #[tokio::test]
    async fn terminated_names_are_forgotten() {
        let manager = DataSourceManager::new();
        manager
            .configure(DataSourceConfig::new("a", "sqlite::memory:"))
            .await
            .unwrap();
        manager
            .configure(DataSourceConfig::new("b", "sqlite::memory:"))
            .await
            .unwrap();
        assert_eq!(slot_count(&manager), 2);

        manager.terminate_configuration("a").await.unwrap();
        assert_eq!(slot_count(&manager), 1);

        assert_eq!(manager.terminate_all().await, 1);
        assert_eq!(slot_count(&manager), 0);
    }

    #[tokio::test]
    async fn failed_configures_are_forgotten() {
        let manager = DataSourceManager::new();
        for n in 0..3 {
            let config = DataSourceConfig::new(format!("bad-{n}"), "sqlite::memory:").pool_size(0);
            assert!(manager.configure(config).await.is_err());
        }
        assert_eq!(slot_count(&manager), 0);

        // A slot still held elsewhere stays put.
        let held = manager.slot_or_insert("held");
        manager
            .configure(DataSourceConfig::new("held", "sqlite::memory:").pool_size(0))
            .await
            .unwrap_err();
        assert_eq!(slot_count(&manager), 1);
        drop(held);
    }
}
