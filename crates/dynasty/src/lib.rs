pub mod data_source;
pub use data_source::{DataSourceConfig, DataSourceManager, Dialect, PooledConnection};

mod db;
pub use db::Db;

mod query;
pub use query::Query;

mod reconcile;
pub use reconcile::{reconcile, reconcile_all, ReconcileOutcome, ReconcileReport};

pub mod registry;
pub use registry::{EntityType, Record, TypeRegistry};

pub use dynasty_core::{
    schema::{
        DataType, DescriptorBuilder, EntityDescriptor, FieldDescriptor, FieldSpec, ManagementMode,
    },
    stmt::Value,
    Error, Result,
};
