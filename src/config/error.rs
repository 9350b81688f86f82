//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking `plume.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("plume.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        assert_eq!(io_err.to_string(), "cannot read config file `plume.toml`");

        let validation_err = ConfigError::Validation("[site.url] is empty".into());
        assert_eq!(validation_err.to_string(), "invalid config: [site.url] is empty");
    }
}
