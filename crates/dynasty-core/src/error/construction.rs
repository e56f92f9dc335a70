use super::Error;

/// A descriptor could not be built, finalized or synthesized.
#[derive(Debug)]
pub(super) struct ConstructionError {
    failure: ConstructionFailure,
    entity: Box<str>,
    detail: Box<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstructionFailure {
    DuplicateProperty,
    DanglingReference,
    UnresolvedDescriptor,
    AlreadyFinalized,
    InvalidField,
}

impl std::error::Error for ConstructionError {}

impl core::fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.failure {
            ConstructionFailure::DuplicateProperty => write!(
                f,
                "duplicate property: `{}` already exists in `{}`",
                self.detail, self.entity
            ),
            ConstructionFailure::DanglingReference => write!(
                f,
                "dangling reference: `{}` refers to `{}`, which is neither resolved nor awaiting finalization",
                self.entity, self.detail
            ),
            ConstructionFailure::UnresolvedDescriptor => write!(
                f,
                "descriptor `{}` is not resolved{}",
                self.entity,
                if self.detail.is_empty() {
                    String::new()
                } else {
                    format!(": {}", self.detail)
                }
            ),
            ConstructionFailure::AlreadyFinalized => {
                write!(f, "descriptor `{}` is already finalized", self.entity)
            }
            ConstructionFailure::InvalidField => {
                write!(f, "invalid field in `{}`: {}", self.entity, self.detail)
            }
        }
    }
}

impl Error {
    fn construction(failure: ConstructionFailure, entity: &str, detail: &str) -> Error {
        Error::from(super::ErrorKind::Construction(ConstructionError {
            failure,
            entity: entity.into(),
            detail: detail.into(),
        }))
    }

    fn is_construction_failure(&self, failure: ConstructionFailure) -> bool {
        self.any_kind(|kind| {
            matches!(kind, super::ErrorKind::Construction(err) if err.failure == failure)
        })
    }

    pub fn duplicate_property(entity: &str, property: &str) -> Error {
        Error::construction(ConstructionFailure::DuplicateProperty, entity, property)
    }

    pub fn dangling_reference(entity: &str, target: &str) -> Error {
        Error::construction(ConstructionFailure::DanglingReference, entity, target)
    }

    pub fn unresolved_descriptor(entity: &str, detail: &str) -> Error {
        Error::construction(ConstructionFailure::UnresolvedDescriptor, entity, detail)
    }

    pub fn already_finalized(entity: &str) -> Error {
        Error::construction(ConstructionFailure::AlreadyFinalized, entity, "")
    }

    pub fn invalid_field(entity: &str, message: impl Into<String>) -> Error {
        Error::construction(ConstructionFailure::InvalidField, entity, &message.into())
    }

    pub fn is_duplicate_property(&self) -> bool {
        self.is_construction_failure(ConstructionFailure::DuplicateProperty)
    }

    pub fn is_dangling_reference(&self) -> bool {
        self.is_construction_failure(ConstructionFailure::DanglingReference)
    }

    pub fn is_unresolved_descriptor(&self) -> bool {
        self.is_construction_failure(ConstructionFailure::UnresolvedDescriptor)
    }

    pub fn is_already_finalized(&self) -> bool {
        self.is_construction_failure(ConstructionFailure::AlreadyFinalized)
    }

    pub fn is_invalid_field(&self) -> bool {
        self.is_construction_failure(ConstructionFailure::InvalidField)
    }
}
