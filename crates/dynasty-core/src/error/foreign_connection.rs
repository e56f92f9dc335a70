use super::Error;

/// A connection was handed back to a pool that did not issue it.
#[derive(Debug)]
pub(super) struct ForeignConnection {
    name: Box<str>,
}

impl std::error::Error for ForeignConnection {}

impl core::fmt::Display for ForeignConnection {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "connection was not issued by the pool of data source `{}`",
            self.name
        )
    }
}

impl Error {
    pub fn foreign_connection(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ForeignConnection(ForeignConnection {
            name: name.into().into_boxed_str(),
        }))
    }

    pub fn is_foreign_connection(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::ForeignConnection(_)))
    }
}
