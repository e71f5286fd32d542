//! Error types for the web input layer.
//!
//! Most malformed or unsupported native input is not an error: it is
//! dropped and logged. The variants here cover the few conditions a host
//! has to react to.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the input translation layer.
#[derive(Error, Debug)]
pub enum InputError {
    /// More touch points are live than the engine can track.
    ///
    /// The engine's velocity tracker supports a fixed number of concurrent
    /// pointers. Exceeding it is a platform invariant violation; hosts
    /// should treat it as fatal.
    #[error("touch point limit exceeded: {live} points already live")]
    TouchIdsExhausted { live: usize },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating [`InputConfig`](crate::config::InputConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value outside its valid range.
    #[error("invalid value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result type for input layer operations.
pub type InputResult<T> = Result<T, InputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_exhaustion_message() {
        let err = InputError::TouchIdsExhausted { live: 16 };
        assert_eq!(
            err.to_string(),
            "touch point limit exceeded: 16 points already live"
        );
    }

    #[test]
    fn test_config_error_converts() {
        let err: InputError = ConfigError::invalid("wheel_scroll_lines", "must be > 0").into();
        assert!(matches!(err, InputError::Config(ConfigError::Invalid { .. })));
        assert!(err.to_string().contains("wheel_scroll_lines"));
    }
}
