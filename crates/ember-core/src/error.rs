//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    /// A curve, gradient or sequence was given inconsistent data.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An emitter references an image the sprite source cannot supply.
    #[error("Missing image '{path}' for emitter '{emitter}'")]
    MissingImage { emitter: String, path: String },

    /// A persisted effect could not be parsed.
    #[error("Format error in {source_name} at line {line}: {message}")]
    Format {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

impl EmberError {
    /// Shorthand for a configuration error with a formatted message
    pub fn config(message: impl Into<String>) -> Self {
        EmberError::Configuration(message.into())
    }

    /// Attach a source identity to a format error that was raised without one.
    ///
    /// Errors of any other kind pass through unchanged.
    pub fn with_source(self, name: &str) -> Self {
        match self {
            EmberError::Format {
                source_name,
                line,
                message,
            } if source_name.is_empty() => EmberError::Format {
                source_name: name.to_string(),
                line,
                message,
            },
            EmberError::TomlParse(message) => EmberError::Format {
                source_name: name.to_string(),
                line: 0,
                message,
            },
            other => other,
        }
    }
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for EmberError {
    fn from(err: toml::ser::Error) -> Self {
        EmberError::TomlSer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_source_fills_empty_name_only() {
        let err = EmberError::Format {
            source_name: String::new(),
            line: 4,
            message: "bad float".into(),
        };
        let named = err.with_source("fire.p");
        assert_eq!(
            named.to_string(),
            "Format error in fire.p at line 4: bad float"
        );

        let already = EmberError::Format {
            source_name: "a.p".into(),
            line: 1,
            message: "x".into(),
        }
        .with_source("b.p");
        assert!(already.to_string().contains("a.p"));
    }

    #[test]
    fn with_source_leaves_other_errors() {
        let err = EmberError::config("mismatch").with_source("fire.p");
        assert!(matches!(err, EmberError::Configuration(_)));
    }
}
