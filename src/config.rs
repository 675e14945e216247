use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::model_client::ProviderKind;

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Generative-model service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Config {
            model: ModelConfig::from_env(),
            database: DatabaseConfig::from_env(),
            server: ServerConfig::from_env()?,
            auth: AuthConfig::from_env(),
            logging: LoggingConfig::from_env(),
        };

        config.log_configuration_summary();
        Ok(config)
    }

    fn log_configuration_summary(&self) {
        info!(
            model_provider = ?self.model.provider,
            model_name = ?self.model.model,
            database_url_masked = %mask_sensitive_data(&self.database.url),
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values. The model API key is mandatory: every
    /// assistant and mentor endpoint depends on it, so startup fails loudly
    /// instead of running with a disabled model client.
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.trim().is_empty() {
            return Err(anyhow!(
                "Model API key not set. Provide MODEL_API_KEY (or GOOGLE_API_KEY) before starting."
            ));
        }

        if !self.database.url.contains("sqlite:") {
            return Err(anyhow!("DATABASE_URL must start with 'sqlite:'"));
        }

        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if self.auth.jwt_secret == AuthConfig::DEFAULT_SECRET {
            warn!("JWT_SECRET is the built-in default - set a real secret in production");
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl ModelConfig {
    fn from_env() -> Self {
        let api_key = env::var("MODEL_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .unwrap_or_default();

        let base_url = env::var("MODEL_BASE_URL").ok();

        let provider_str =
            env::var("MODEL_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" | "chatgpt" | "gpt" => ProviderKind::OpenAI,
            "gemini" | "google" => ProviderKind::Gemini,
            _ => {
                info!("Unknown model provider '{}', defaulting to Gemini", provider_str);
                ProviderKind::Gemini
            }
        };

        let model = env::var("MODEL_NAME").ok();

        let timeout_secs = env::var("MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        ModelConfig {
            api_key,
            base_url,
            provider,
            model,
            timeout_secs,
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Self {
        let url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:edulearn.db?mode=rwc".to_string());
        DatabaseConfig { url }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }
}

impl AuthConfig {
    const DEFAULT_SECRET: &'static str = "supersecretkey";

    fn from_env() -> Self {
        let jwt_secret =
            env::var("JWT_SECRET").unwrap_or_else(|_| Self::DEFAULT_SECRET.to_string());

        let token_ttl_minutes = env::var("TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30);

        AuthConfig {
            jwt_secret,
            token_ttl_minutes,
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Self {
        let level =
            env::var("RUST_LOG").unwrap_or_else(|_| "info,edulearn_backend=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY").unwrap_or_else(|_| "logs".to_string());

        LoggingConfig {
            level,
            file_enabled,
            log_directory,
        }
    }
}

/// Mask sensitive data in configuration for safe logging.
fn mask_sensitive_data(data: &str) -> String {
    if data.len() <= 8 {
        "*".repeat(data.len())
    } else {
        format!("{}***{}", &data[..4], &data[data.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("sqlite:edulearn.db"), "sqli***n.db");
    }

    fn valid_config() -> Config {
        Config {
            model: ModelConfig {
                api_key: "AIza-test-key".to_string(),
                base_url: None,
                provider: ProviderKind::Gemini,
                model: None,
                timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: "sqlite:test.db".to_string(),
            },
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_ttl_minutes: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: false,
                log_directory: "logs".to_string(),
            },
        }
    }

    #[test]
    fn valid_configuration_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_model_api_key_fails_validation() {
        let mut config = valid_config();
        config.model.api_key = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Model API key"));

        config.model.api_key = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_sqlite_database_url_fails_validation() {
        let mut config = valid_config();
        config.database.url = "postgres://localhost/db".to_string();
        assert!(config.validate().is_err());
    }
}
