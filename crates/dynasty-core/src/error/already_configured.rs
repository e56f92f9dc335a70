use super::Error;

/// A data source is already configured under the requested name.
#[derive(Debug)]
pub(super) struct AlreadyConfigured {
    name: Box<str>,
}

impl std::error::Error for AlreadyConfigured {}

impl core::fmt::Display for AlreadyConfigured {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "data source `{}` is already configured", self.name)
    }
}

impl Error {
    pub fn already_configured(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AlreadyConfigured(AlreadyConfigured {
            name: name.into().into_boxed_str(),
        }))
    }

    pub fn is_already_configured(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::AlreadyConfigured(_)))
    }
}
