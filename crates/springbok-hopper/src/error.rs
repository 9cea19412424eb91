use thiserror::Error;

use springbok_nlp::NlpError;

/// Top-level error type for springbok-hopper.
#[derive(Debug, Error)]
pub enum HopperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("NLP error: {0}")]
    Nlp(#[from] NlpError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hopper_error_from_config_error() {
        let err = ConfigError::InvalidValue {
            field: "n_knotpoints",
            message: "must be at least 3".into(),
        };
        let hopper_err: HopperError = err.into();
        assert!(matches!(hopper_err, HopperError::Config(_)));
        assert!(hopper_err.to_string().contains("n_knotpoints"));
    }

    #[test]
    fn hopper_error_from_nlp_error() {
        let err = NlpError::Unconfigured("contact jacobian");
        let hopper_err: HopperError = err.into();
        assert!(matches!(hopper_err, HopperError::Nlp(_)));
    }
}
