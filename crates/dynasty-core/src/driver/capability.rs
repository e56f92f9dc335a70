use crate::schema::db;

#[derive(Debug)]
pub struct Capability {
    /// Column storage types supported by the database
    pub storage_types: StorageTypes,

    /// Supports `INSERT ... RETURNING`
    pub insert_returning: bool,
}

#[derive(Debug)]
pub struct StorageTypes {
    /// The default storage type for a string.
    pub default_string_type: db::Type,

    /// When `Some` the database supports varchar types with the specified upper
    /// limit.
    pub varchar: Option<u64>,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        storage_types: StorageTypes::SQLITE,
        insert_returning: true,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        storage_types: StorageTypes::POSTGRESQL,
        ..Self::SQLITE
    };
}

impl StorageTypes {
    /// SQLite storage types
    pub const SQLITE: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,

        // SQLite ignores the length of VARCHAR(N); the only hard limit is
        // SQLITE_MAX_LENGTH, one billion by default.
        varchar: Some(1_000_000_000),
    };

    pub const POSTGRESQL: StorageTypes = StorageTypes {
        default_string_type: db::Type::Text,

        // The maximum n you can specify is 10 485 760 characters.
        varchar: Some(10_485_760),
    };
}
