use super::Error;

/// A record or query referenced a property its type does not declare, or
/// tried to write a read-only one.
#[derive(Debug)]
pub(super) struct UnknownProperty {
    entity: Box<str>,
    property: Box<str>,
    read_only: bool,
}

impl std::error::Error for UnknownProperty {}

impl core::fmt::Display for UnknownProperty {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.read_only {
            write!(
                f,
                "property `{}` of `{}` is read-only",
                self.property, self.entity
            )
        } else {
            write!(
                f,
                "unknown property `{}` on `{}`",
                self.property, self.entity
            )
        }
    }
}

impl Error {
    pub fn unknown_property(entity: impl Into<String>, property: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownProperty(UnknownProperty {
            entity: entity.into().into(),
            property: property.into().into(),
            read_only: false,
        }))
    }

    pub fn read_only_property(entity: impl Into<String>, property: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownProperty(UnknownProperty {
            entity: entity.into().into(),
            property: property.into().into(),
            read_only: true,
        }))
    }

    pub fn is_unknown_property(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnknownProperty(_)))
    }
}
