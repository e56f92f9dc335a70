use super::Error;

/// A query was rejected before reaching the database.
#[derive(Debug)]
pub(super) struct InvalidQuery {
    message: Box<str>,
}

impl std::error::Error for InvalidQuery {}

impl core::fmt::Display for InvalidQuery {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid query: {}", self.message)
    }
}

impl Error {
    pub fn invalid_query(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidQuery(InvalidQuery {
            message: message.into().into(),
        }))
    }

    pub fn is_invalid_query(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidQuery(_)))
    }
}
