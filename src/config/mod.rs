use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Secret used when `JWT_SECRET_KEY` is not set. Refused in production.
pub const DEV_JWT_SECRET: &str = "cohort-dev-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub allow_registration: bool,
    /// Lets `/auth/register` pick a role other than `student`.
    pub allow_role_on_register: bool,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_password_length: usize,
    pub min_description_length: usize,
    pub github_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        override_from_env("COHORT_API_HOST", &mut self.server.host);
        override_from_env("PORT", &mut self.server.port);
        override_from_env("COHORT_API_PORT", &mut self.server.port);

        let db = &mut self.database;
        override_from_env("DATABASE_URL", &mut db.url);
        override_from_env("DATABASE_MAX_CONNECTIONS", &mut db.max_connections);
        override_from_env("DATABASE_CONNECTION_TIMEOUT", &mut db.connection_timeout);

        let sec = &mut self.security;
        override_from_env("JWT_SECRET_KEY", &mut sec.jwt_secret);
        override_from_env("SECURITY_JWT_EXPIRY_HOURS", &mut sec.jwt_expiry_hours);
        override_from_env("SECURITY_ENABLE_CORS", &mut sec.enable_cors);
        override_from_env("SECURITY_ALLOW_REGISTRATION", &mut sec.allow_registration);
        override_from_env("SECURITY_ALLOW_ROLE_ON_REGISTER", &mut sec.allow_role_on_register);
        override_from_env("SECURITY_BCRYPT_COST", &mut sec.bcrypt_cost);
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            sec.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        let rules = &mut self.validation;
        override_from_env("VALIDATION_MIN_PASSWORD_LENGTH", &mut rules.min_password_length);
        override_from_env("VALIDATION_MIN_DESCRIPTION_LENGTH", &mut rules.min_description_length);
        override_from_env("VALIDATION_GITHUB_PREFIX", &mut rules.github_prefix);

        self
    }

    /// Rejects settings that must never reach a production deployment.
    pub fn check(&self) -> Result<(), String> {
        if self.security.jwt_secret.is_empty() {
            return Err("JWT secret is empty".to_string());
        }
        if self.environment == Environment::Production && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT_SECRET_KEY must be set in production".to_string());
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://cohort.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                allow_registration: true,
                allow_role_on_register: true,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            validation: ValidationConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://cohort.db?mode=rwc".to_string(),
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                allow_registration: true,
                allow_role_on_register: false,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            validation: ValidationConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://cohort.db?mode=rwc".to_string(),
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                allow_registration: false,
                allow_role_on_register: false,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            validation: ValidationConfig::default(),
        }
    }
}

/// Replace `slot` with the parsed value of `key`; unset or unparsable
/// values leave the preset in place.
fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.trim().parse().ok()) {
        *slot = value;
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            min_description_length: 10,
            github_prefix: "https://github.com/".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.security.allow_registration);
        assert_eq!(config.validation.min_password_length, 8);
        assert_eq!(config.validation.github_prefix, "https://github.com/");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.security.allow_registration);
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn production_refuses_dev_secret() {
        let mut config = AppConfig::production();
        assert!(config.check().is_err());

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.check().is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut config = AppConfig::development();
        config.security.jwt_secret.clear();
        assert!(config.check().is_err());
    }

    #[test]
    fn env_overrides_ignore_garbage() {
        let mut port: u16 = 5000;
        std::env::set_var("COHORT_TEST_OVERRIDE_PORT", "not-a-port");
        override_from_env("COHORT_TEST_OVERRIDE_PORT", &mut port);
        assert_eq!(port, 5000);

        std::env::set_var("COHORT_TEST_OVERRIDE_PORT", " 8080 ");
        override_from_env("COHORT_TEST_OVERRIDE_PORT", &mut port);
        assert_eq!(port, 8080);
        std::env::remove_var("COHORT_TEST_OVERRIDE_PORT");
    }
}
