use super::Error;

/// A qualified name is already bound in the type registry to a different
/// shape at the same or a later version.
#[derive(Debug)]
pub(super) struct NameAlreadyBound {
    name: Box<str>,
    version: u32,
}

impl std::error::Error for NameAlreadyBound {}

impl core::fmt::Display for NameAlreadyBound {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "`{}` is already bound to a different shape at version {}",
            self.name, self.version
        )
    }
}

impl Error {
    pub fn name_already_bound(name: impl Into<String>, version: u32) -> Error {
        Error::from(super::ErrorKind::NameAlreadyBound(NameAlreadyBound {
            name: name.into().into_boxed_str(),
            version,
        }))
    }

    pub fn is_name_already_bound(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::NameAlreadyBound(_)))
    }
}
