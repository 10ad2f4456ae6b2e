use std::fmt;

/// Errors returned by the sanitizer.
///
/// Messages never echo the markup being cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The policy configuration was rejected
    Config(ConfigError),
    /// A caller-supplied transformer failed; the whole clean call was aborted
    TransformerFailed {
        /// Position of the transformer in the policy's pipeline
        index: usize,
        /// Message reported by the transformer
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error came from a transformer.
    pub fn is_transformer_failure(&self) -> bool {
        matches!(self, Error::TransformerFailed { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "invalid policy: {}", e),
            Error::TransformerFailed { index, message } => {
                write!(f, "transformer #{} failed: {}", index, message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::TransformerFailed { .. } => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// A policy configuration that failed validation.
///
/// Raised by [`PolicyBuilder::build`](crate::PolicyBuilder::build) and
/// [`PolicyConfig::from_json`](crate::PolicyConfig::from_json), never by a
/// clean call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Kind of configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// An option name the policy does not recognize.
    UnknownOption,
    /// An element name that is empty or contains characters outside `[a-z0-9-]`.
    InvalidElementName,
    /// An attribute name that could not be serialized safely.
    InvalidAttributeName,
    /// A protocol entry that is not a valid URI scheme.
    InvalidProtocol,
    /// The configuration document itself could not be read.
    Malformed,
    /// A callback point other than `save` or `create`.
    InvalidCallbackPoint,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOption => write!(f, "unknown option"),
            Self::InvalidElementName => write!(f, "invalid element name"),
            Self::InvalidAttributeName => write!(f, "invalid attribute name"),
            Self::InvalidProtocol => write!(f, "invalid protocol"),
            Self::Malformed => write!(f, "malformed configuration"),
            Self::InvalidCallbackPoint => write!(f, "invalid callback point"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_accessors() {
        let error = ConfigError::new(ConfigErrorKind::InvalidElementName, "element `a b`");

        assert_eq!(error.kind(), ConfigErrorKind::InvalidElementName);
        assert_eq!(error.message(), "element `a b`");
    }

    #[test]
    fn config_error_display() {
        let error = ConfigError::new(ConfigErrorKind::UnknownOption, "`colour`");
        assert_eq!(format!("{}", error), "unknown option: `colour`");

        let wrapped: Error = error.into();
        assert_eq!(
            format!("{}", wrapped),
            "invalid policy: unknown option: `colour`"
        );
    }

    #[test]
    fn transformer_failure_display() {
        let error = Error::TransformerFailed {
            index: 2,
            message: "bad style".to_string(),
        };

        assert!(error.is_transformer_failure());
        assert_eq!(format!("{}", error), "transformer #2 failed: bad style");
    }

    #[test]
    fn config_error_is_source() {
        use std::error::Error as _;

        let error: Error = ConfigError::new(ConfigErrorKind::Malformed, "eof").into();
        assert!(error.source().is_some());
        assert!(!error.is_transformer_failure());
    }

    #[test]
    fn error_kinds_display() {
        assert_eq!(
            format!("{}", ConfigErrorKind::InvalidAttributeName),
            "invalid attribute name"
        );
        assert_eq!(
            format!("{}", ConfigErrorKind::InvalidProtocol),
            "invalid protocol"
        );
        assert_eq!(
            format!("{}", ConfigErrorKind::InvalidCallbackPoint),
            "invalid callback point"
        );
    }
}
