mod adhoc;
mod already_configured;
mod connection_pool;
mod construction;
mod driver_operation_failed;
mod foreign_connection;
mod invalid_connection_url;
mod invalid_driver_configuration;
mod invalid_query;
mod name_already_bound;
mod not_configured;
mod pool_exhausted;
mod record_not_found;
mod schema_migration;
mod type_conversion;
mod unknown_property;
mod unsupported_feature;
mod version_mismatch;

use adhoc::AdhocError;
use already_configured::AlreadyConfigured;
use connection_pool::ConnectionPoolError;
use construction::ConstructionError;
use driver_operation_failed::DriverOperationFailed;
use foreign_connection::ForeignConnection;
use invalid_connection_url::InvalidConnectionUrl;
use invalid_driver_configuration::InvalidDriverConfiguration;
use invalid_query::InvalidQuery;
use name_already_bound::NameAlreadyBound;
use not_configured::NotConfigured;
use pool_exhausted::PoolExhausted;
use record_not_found::RecordNotFoundError;
use schema_migration::SchemaMigrationError;
use std::sync::Arc;
use type_conversion::TypeConversionError;
use unknown_property::UnknownProperty;
use unsupported_feature::UnsupportedFeature;
use version_mismatch::VersionMismatch;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Dynasty.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => inner.kind,
                Err(shared) => ErrorKind::Adhoc(AdhocError::from_display(&shared.kind)),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// The innermost error in the context chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.inner.as_ref().and_then(|inner| inner.cause.as_ref()) {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if any error in the context chain matches `f`.
    fn any_kind(&self, f: impl Fn(&ErrorKind) -> bool) -> bool {
        self.chain().any(|err| f(err.kind()))
    }

    /// Returns `true` for errors raised while building or finalizing a
    /// descriptor.
    pub fn is_construction(&self) -> bool {
        self.any_kind(|kind| matches!(kind, ErrorKind::Construction(_)))
    }

    /// Returns `true` for data source lifecycle and pooling errors.
    pub fn is_configuration(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                ErrorKind::AlreadyConfigured(_)
                    | ErrorKind::NotConfigured(_)
                    | ErrorKind::PoolExhausted(_)
                    | ErrorKind::ForeignConnection(_)
                    | ErrorKind::ConnectionPool(_)
                    | ErrorKind::InvalidConnectionUrl(_)
                    | ErrorKind::InvalidDriverConfiguration(_)
            )
        })
    }

    /// Returns `true` for per-call data errors that leave the manager usable.
    pub fn is_data(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                ErrorKind::RecordNotFound(_)
                    | ErrorKind::VersionMismatch(_)
                    | ErrorKind::UnknownProperty(_)
                    | ErrorKind::TypeConversion(_)
                    | ErrorKind::InvalidQuery(_)
            )
        })
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::ConnectionPool(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    AlreadyConfigured(AlreadyConfigured),
    ConnectionPool(ConnectionPoolError),
    Construction(ConstructionError),
    DriverOperationFailed(DriverOperationFailed),
    ForeignConnection(ForeignConnection),
    InvalidConnectionUrl(InvalidConnectionUrl),
    InvalidDriverConfiguration(InvalidDriverConfiguration),
    InvalidQuery(InvalidQuery),
    NameAlreadyBound(NameAlreadyBound),
    NotConfigured(NotConfigured),
    PoolExhausted(PoolExhausted),
    RecordNotFound(RecordNotFoundError),
    SchemaMigration(SchemaMigrationError),
    TypeConversion(TypeConversionError),
    UnknownProperty(UnknownProperty),
    UnsupportedFeature(UnsupportedFeature),
    VersionMismatch(VersionMismatch),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            AlreadyConfigured(err) => core::fmt::Display::fmt(err, f),
            ConnectionPool(err) => core::fmt::Display::fmt(err, f),
            Construction(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            ForeignConnection(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            InvalidDriverConfiguration(err) => core::fmt::Display::fmt(err, f),
            InvalidQuery(err) => core::fmt::Display::fmt(err, f),
            NameAlreadyBound(err) => core::fmt::Display::fmt(err, f),
            NotConfigured(err) => core::fmt::Display::fmt(err, f),
            PoolExhausted(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            SchemaMigration(err) => core::fmt::Display::fmt(err, f),
            TypeConversion(err) => core::fmt::Display::fmt(err, f),
            UnknownProperty(err) => core::fmt::Display::fmt(err, f),
            UnsupportedFeature(err) => core::fmt::Display::fmt(err, f),
            VersionMismatch(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown dynasty error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
