mod config;
pub use config::{Credentials, DataSourceConfig, Dialect};

mod connect;

mod manager;
pub use manager::DataSourceManager;

mod pool;
pub use pool::PooledConnection;
pub(crate) use pool::Pool;
