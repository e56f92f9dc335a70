use super::Error;

/// A schema reconciliation step could not be planned or applied.
#[derive(Debug)]
pub(super) struct SchemaMigrationError {
    table: Box<str>,
    message: Box<str>,
}

impl std::error::Error for SchemaMigrationError {}

impl core::fmt::Display for SchemaMigrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "schema migration failed for `{}`: {}", self.table, self.message)
    }
}

impl Error {
    pub fn schema_migration(table: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SchemaMigration(SchemaMigrationError {
            table: table.into().into(),
            message: message.into().into(),
        }))
    }

    pub fn is_schema_migration(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::SchemaMigration(_)))
    }
}
