//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT signing key, payment processor key, mail API key) are read
//! once at startup and cached in memory.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and payment redirects
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Payment processor secret key. None disables checkout/verify
    /// confirmation against the processor (local dev).
    pub payment_secret_key: Option<String>,
    /// Mail delivery API key. None disables outbound mail.
    pub mail_api_key: Option<String>,
    /// Sender address for outbound mail
    pub mail_from: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            payment_secret_key: env::var("PAYMENT_SECRET_KEY")
                .ok()
                .map(|v| v.trim().to_string()),
            mail_api_key: env::var("MAIL_API_KEY").ok().map(|v| v.trim().to_string()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@learnhub.dev".to_string()),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 4000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            payment_secret_key: None,
            mail_api_key: None,
            mail_from: "no-reply@learnhub.dev".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(
            config.jwt_signing_key,
            b"test_jwt_key_32_bytes_minimum!!".to_vec()
        );
        assert_eq!(config.mail_from, "no-reply@learnhub.dev");
    }

    #[test]
    fn test_test_default_has_no_collaborator_keys() {
        let config = Config::test_default();
        assert!(config.payment_secret_key.is_none());
        assert!(config.mail_api_key.is_none());
    }
}
