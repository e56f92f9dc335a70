use super::Error;
use std::time::Duration;

/// No pooled connection became available within the checkout timeout.
#[derive(Debug)]
pub(super) struct PoolExhausted {
    name: Box<str>,
    waited: Duration,
}

impl std::error::Error for PoolExhausted {}

impl core::fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "connection pool for `{}` exhausted after waiting {:?}",
            self.name, self.waited
        )
    }
}

impl Error {
    pub fn pool_exhausted(name: impl Into<String>, waited: Duration) -> Error {
        Error::from(super::ErrorKind::PoolExhausted(PoolExhausted {
            name: name.into().into_boxed_str(),
            waited,
        }))
    }

    pub fn is_pool_exhausted(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::PoolExhausted(_)))
    }
}
