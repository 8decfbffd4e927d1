use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::lockout::LockoutPolicy;
use crate::error::{LockgateError, Result};

/// Main configuration for a lockgate server.
///
/// Token expiry windows, the signing secret, and lockout thresholds all
/// live here and are handed to the auth service at construction; operation
/// logic never reads the environment directly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub lockout: LockoutPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 10MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Settings consumed by the auth service and session token issuer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens. Required.
    pub jwt_secret: String,
    /// Session token lifetime (default: 7 days).
    pub session_ttl: Duration,
    /// Email verification token lifetime (default: 24 hours).
    pub verification_token_ttl: Duration,
    /// Password reset token lifetime (default: 1 hour).
    pub reset_token_ttl: Duration,
    /// Upper bound on any single Notifier call (default: 10 seconds).
    pub notify_timeout: Duration,
    /// Base URL used in emailed verification/reset links.
    pub client_url: String,
    /// From address for outbound email.
    pub email_from: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            verification_token_ttl: Duration::from_secs(24 * 60 * 60),
            reset_token_ttl: Duration::from_secs(60 * 60),
            notify_timeout: Duration::from_secs(10),
            client_url: "http://localhost:3000".to_string(),
            email_from: "no-reply@example.com".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            lockout: LockoutPolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB, matching the API body limit
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Read `LOCKGATE_<NAME>` from the environment.
fn get_env(name: &str) -> Option<String> {
    std::env::var(format!("LOCKGATE_{name}")).ok()
}

fn get_env_secs(name: &str) -> Option<Duration> {
    get_env(name)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Builder for Config with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = secret.into();
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.config.auth.session_ttl = ttl;
        self
    }

    pub fn with_client_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth.client_url = url.into();
        self
    }

    pub fn with_email_from(mut self, from: impl Into<String>) -> Self {
        self.config.auth.email_from = from.into();
        self
    }

    pub fn with_lockout(mut self, lockout: LockoutPolicy) -> Self {
        self.config.lockout = lockout;
        self
    }

    /// Load configuration from environment variables with LOCKGATE_ prefix.
    ///
    /// `PORT` and `JWT_SECRET`/`CLIENT_URL` are also honored bare, for
    /// platform compatibility and parity with the original deployment.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env("PORT").or_else(|| std::env::var("PORT").ok()) {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = get_env("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        if let Some(secret) = get_env("JWT_SECRET").or_else(|| std::env::var("JWT_SECRET").ok()) {
            self.config.auth.jwt_secret = secret;
        }
        if let Some(ttl) = get_env_secs("SESSION_TTL_SECS") {
            self.config.auth.session_ttl = ttl;
        }
        if let Some(ttl) = get_env_secs("VERIFICATION_TTL_SECS") {
            self.config.auth.verification_token_ttl = ttl;
        }
        if let Some(ttl) = get_env_secs("RESET_TTL_SECS") {
            self.config.auth.reset_token_ttl = ttl;
        }
        if let Some(timeout) = get_env_secs("NOTIFY_TIMEOUT_SECS") {
            self.config.auth.notify_timeout = timeout;
        }
        if let Some(url) = get_env("CLIENT_URL").or_else(|| std::env::var("CLIENT_URL").ok()) {
            self.config.auth.client_url = url;
        }
        if let Some(from) = get_env("EMAIL_FROM") {
            self.config.auth.email_from = from;
        }

        if let Some(max) = get_env("LOCKOUT_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.config.lockout.max_attempts = max;
        }
        if let Some(duration) = get_env_secs("LOCKOUT_DURATION_SECS") {
            self.config.lockout.lockout_duration = duration;
        }

        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            LockgateError::internal(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(LockgateError::internal("Server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(LockgateError::internal(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.auth.jwt_secret.is_empty() {
            return Err(LockgateError::internal(
                "JWT secret is required (set LOCKGATE_JWT_SECRET or JWT_SECRET)",
            ));
        }

        if self.config.auth.session_ttl.is_zero()
            || self.config.auth.verification_token_ttl.is_zero()
            || self.config.auth.reset_token_ttl.is_zero()
        {
            return Err(LockgateError::internal(
                "Token lifetimes must be greater than zero",
            ));
        }

        if self.config.lockout.max_attempts == 0 {
            return Err(LockgateError::internal(
                "Lockout max_attempts must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder {
        ConfigBuilder::new().with_jwt_secret("test-secret-32-bytes-long-enough")
    }

    #[test]
    fn test_defaults_build() {
        let config = builder().build().unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(
            config.auth.verification_token_ttl,
            Duration::from_secs(24 * 60 * 60)
        );
        assert_eq!(config.auth.reset_token_ttl, Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_missing_secret_rejected() {
        let result = ConfigBuilder::new().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = builder().with_port(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = builder().with_log_level("verbose").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = builder()
            .with_host("127.0.0.1")
            .with_port(8080)
            .with_client_url("https://app.example.com")
            .build()
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.client_url, "https://app.example.com");
        assert!(config.server.addr().is_ok());
    }
}
