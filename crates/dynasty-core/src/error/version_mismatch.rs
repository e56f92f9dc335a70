use super::Error;

/// An optimistic update found the row at a different version than the
/// caller expected.
#[derive(Debug)]
pub(super) struct VersionMismatch {
    table: Box<str>,
    id: i64,
    expected: i64,
}

impl std::error::Error for VersionMismatch {}

impl core::fmt::Display for VersionMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "version mismatch: table={} id={} expected version {}",
            self.table, self.id, self.expected
        )
    }
}

impl Error {
    pub fn version_mismatch(table: impl Into<String>, id: i64, expected: i64) -> Error {
        Error::from(super::ErrorKind::VersionMismatch(VersionMismatch {
            table: table.into().into(),
            id,
            expected,
        }))
    }

    pub fn is_version_mismatch(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::VersionMismatch(_)))
    }
}
