mod builder;
pub use builder::{DescriptorBuilder, FieldSpec};

mod data_type;
pub use data_type::DataType;

pub mod db;

mod descriptor;
pub use descriptor::{EntityDescriptor, IndexSpec, ManagementMode, Resolved, WeakDescriptor};

mod field;
pub use field::{FieldDescriptor, FieldKind, GenerationMode};

/// Property name of the implicit identity field.
pub const ID_PROPERTY: &str = "id";

/// Column backing the implicit identity field.
pub const ID_COLUMN: &str = "id";

/// Property name of the implicit optimistic-lock version field.
pub const VERSION_PROPERTY: &str = "versionNo";

/// Column backing the implicit version field.
pub const VERSION_COLUMN: &str = "version_no";
