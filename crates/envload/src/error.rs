//! Error types for record population.

use thiserror::Error;

/// Boxed error returned by user-supplied conversions ([`Setter`],
/// [`TextUnmarshaler`], [`BinaryUnmarshaler`]).
///
/// [`Setter`]: crate::convert::Setter
/// [`TextUnmarshaler`]: crate::convert::TextUnmarshaler
/// [`BinaryUnmarshaler`]: crate::convert::BinaryUnmarshaler
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while populating a record.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The target is not a mutable reference to a record.
    #[error("must be a mutable reference to a record")]
    InvalidTarget,

    /// The target reference is absent.
    #[error("the reference should not be absent")]
    NilTarget,

    /// A required variable was not found by the lookup.
    #[error("missing required environment variable \"{name}\"")]
    MissingRequired { name: String },

    /// A value was found but could not be converted to the field's type.
    #[error("error reading \"{field}\": {source}")]
    Conversion {
        field: String,
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// Create a conversion error for the named field.
    pub fn conversion(field: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Conversion {
            field: field.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this error reports a missing required variable.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingRequired { .. })
    }
}

/// Errors produced when a string cannot be parsed as a primitive value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseValueError {
    /// The text is not a valid literal for the target type.
    #[error("invalid syntax for {kind}: {value:?}")]
    InvalidSyntax { value: String, kind: &'static str },

    /// The literal is valid but does not fit the target type.
    #[error("value out of range for {kind}: {value:?}")]
    OutOfRange { value: String, kind: &'static str },
}

impl ParseValueError {
    pub(crate) fn syntax(value: &str, kind: &'static str) -> Self {
        Self::InvalidSyntax {
            value: value.to_string(),
            kind,
        }
    }

    pub(crate) fn range(value: &str, kind: &'static str) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            kind,
        }
    }
}

/// Convenience type alias for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_names_the_variable() {
        let err = LoadError::MissingRequired {
            name: "APP_PORT".into(),
        };
        assert!(err.is_missing());
        assert_eq!(
            err.to_string(),
            "missing required environment variable \"APP_PORT\""
        );
    }

    #[test]
    fn conversion_wraps_source() {
        let err = LoadError::conversion("Port", ParseValueError::syntax("a8080", "i32"));
        assert!(!err.is_missing());
        assert_eq!(
            err.to_string(),
            "error reading \"Port\": invalid syntax for i32: \"a8080\""
        );
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<ParseValueError>().is_some());
    }
}
