use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A flag name that is not registered.
    #[error("flag provided but not defined: -{name}")]
    UnknownFlag {
        /// Flag name without leading dashes.
        name: String,
    },

    /// A non-boolean flag appeared as the last argument without a value.
    #[error("flag needs an argument: -{name}")]
    MissingFlagValue {
        /// Flag name without leading dashes.
        name: String,
    },

    /// A flag value could not be parsed for the flag's kind.
    #[error("invalid value {value:?} for flag -{name}: {message}")]
    InvalidFlagValue {
        /// Flag name without leading dashes.
        name: String,
        /// The raw value as given on the command line.
        value: String,
        /// Parse failure description.
        message: String,
    },

    /// An argument that starts with a dash but is not a well-formed flag.
    #[error("bad flag syntax: {arg}")]
    BadFlagSyntax {
        /// The offending argument.
        arg: String,
    },

    /// A positional argument was left over after flag parsing.
    #[error("unexpected argument: {arg}")]
    UnexpectedArgument {
        /// The first unconsumed argument.
        arg: String,
    },

    /// `-h` or `-help` was given.
    #[error("help requested")]
    HelpRequested,

    /// Failed to read a configuration file or directory.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the config file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a JSON configuration document.
    #[error("Failed to parse config file at {path}: {source}")]
    JsonError {
        /// Path to the document that failed to parse.
        path: String,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse a TOML configuration document.
    #[error("Failed to parse config file at {path}: {source}")]
    TomlError {
        /// Path to the document that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A duration string reached resolution but does not parse.
    #[error("Invalid duration {value:?} in field '{field}': {message}")]
    InvalidDuration {
        /// Field holding the duration.
        field: String,
        /// The raw duration string.
        value: String,
        /// Parse failure description.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },
}

impl ConfigError {
    /// Whether the error was raised while resolving an already merged
    /// fragment rather than while reading or parsing one of the layers.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDuration { .. } | Self::ValidationError { .. }
        )
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
