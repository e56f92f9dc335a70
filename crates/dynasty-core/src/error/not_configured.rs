use super::Error;

/// No data source is configured under the requested name, or it has been
/// terminated.
#[derive(Debug)]
pub(super) struct NotConfigured {
    name: Box<str>,
}

impl std::error::Error for NotConfigured {}

impl core::fmt::Display for NotConfigured {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "data source `{}` is not configured", self.name)
    }
}

impl Error {
    pub fn not_configured(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NotConfigured(NotConfigured {
            name: name.into().into_boxed_str(),
        }))
    }

    pub fn is_not_configured(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::NotConfigured(_)))
    }
}
