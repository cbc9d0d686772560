//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding the model and scaler artifacts
    pub models_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8003),

            models_dir: env::var("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only meaningful when the vars are unset, which is the common
        // test-runner environment.
        if env::var("PORT").is_err() && env::var("MODELS_DIR").is_err() {
            let config = Config::from_env();
            assert_eq!(config.port, 8003);
            assert_eq!(config.models_dir, PathBuf::from("models"));
        }
    }
}
