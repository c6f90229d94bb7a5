//! Configuration management for Portcullis Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session store configuration
    pub session: SessionConfig,
    /// Request authentication configuration
    pub auth: AuthConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Run embedded migrations during bootstrap
    pub run_migrations: bool,
}

/// Backend holding session data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(SessionBackend::Redis),
            "memory" => Ok(SessionBackend::Memory),
            other => Err(anyhow::anyhow!("unknown session store '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub redis_url: String,
    pub cookie_name: String,
    pub ttl_secs: u64,
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            cookie_name: "portcullis_session".to_string(),
            ttl_secs: 86400,
            cookie_secure: false,
        }
    }
}

/// Settings consulted by the identity resolver
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Paths under this prefix authenticate with access tokens
    pub api_path_prefix: String,
    /// Session key holding the signed-in user id
    pub session_user_key: String,
    /// Trust the reverse-proxy identity header
    pub reverse_proxy_auth_enabled: bool,
    /// Create unknown reverse-proxy users on first sight
    pub reverse_proxy_auto_register: bool,
    /// Header carrying the proxied user name
    pub reverse_proxy_auth_user: String,
    /// Domain appended to generated e-mail addresses of auto-registered users
    pub auto_register_email_domain: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_path_prefix: "/api/".to_string(),
            session_user_key: "uid".to_string(),
            reverse_proxy_auth_enabled: false,
            reverse_proxy_auto_register: false,
            reverse_proxy_auth_user: "X-WEBAUTH-USER".to_string(),
            auto_register_email_domain: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
            service_name: "portcullis-core".to_string(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let auth_defaults = AuthConfig::default();
        let session_defaults = SessionConfig::default();

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                run_migrations: env_flag("DATABASE_RUN_MIGRATIONS", true),
            },
            session: SessionConfig {
                backend: env::var("SESSION_STORE")
                    .unwrap_or_else(|_| "redis".to_string())
                    .parse()
                    .context("Invalid SESSION_STORE")?,
                redis_url: env::var("REDIS_URL").unwrap_or(session_defaults.redis_url),
                cookie_name: env::var("SESSION_COOKIE_NAME")
                    .unwrap_or(session_defaults.cookie_name),
                ttl_secs: env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(session_defaults.ttl_secs),
                cookie_secure: env_flag("SESSION_COOKIE_SECURE", false),
            },
            auth: AuthConfig {
                api_path_prefix: env::var("AUTH_API_PATH_PREFIX")
                    .unwrap_or(auth_defaults.api_path_prefix),
                session_user_key: env::var("AUTH_SESSION_USER_KEY")
                    .unwrap_or(auth_defaults.session_user_key),
                reverse_proxy_auth_enabled: env_flag("REVERSE_PROXY_AUTH_ENABLED", false),
                reverse_proxy_auto_register: env_flag("REVERSE_PROXY_AUTO_REGISTER", false),
                reverse_proxy_auth_user: env::var("REVERSE_PROXY_AUTH_USER")
                    .unwrap_or(auth_defaults.reverse_proxy_auth_user),
                auto_register_email_domain: env::var("AUTO_REGISTER_EMAIL_DOMAIN")
                    .unwrap_or(auth_defaults.auto_register_email_domain),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: env_flag("METRICS_ENABLED", false),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "portcullis-core".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database: DatabaseConfig {
                url: "mysql://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 2,
                run_migrations: false,
            },
            session: SessionConfig::default(),
            auth: AuthConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn test_config_http_addr() {
        let config = test_config();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_config_http_addr_ipv6() {
        let mut config = test_config();
        config.http_host = "::1".to_string();
        config.http_port = 3000;

        assert_eq!(config.http_addr(), "::1:3000");
    }

    #[test]
    fn test_auth_config_default() {
        let auth = AuthConfig::default();
        assert_eq!(auth.api_path_prefix, "/api/");
        assert_eq!(auth.session_user_key, "uid");
        assert!(!auth.reverse_proxy_auth_enabled);
        assert!(!auth.reverse_proxy_auto_register);
        assert_eq!(auth.reverse_proxy_auth_user, "X-WEBAUTH-USER");
        assert_eq!(auth.auto_register_email_domain, "localhost");
    }

    #[test]
    fn test_session_config_default() {
        let session = SessionConfig::default();
        assert_eq!(session.backend, SessionBackend::Memory);
        assert_eq!(session.cookie_name, "portcullis_session");
        assert_eq!(session.ttl_secs, 86400);
        assert!(!session.cookie_secure);
    }

    #[test]
    fn test_session_backend_parse() {
        assert_eq!(
            "redis".parse::<SessionBackend>().unwrap(),
            SessionBackend::Redis
        );
        assert_eq!(
            "MEMORY".parse::<SessionBackend>().unwrap(),
            SessionBackend::Memory
        );
        assert!("memcache".parse::<SessionBackend>().is_err());
    }

    #[test]
    fn test_config_debug() {
        let config = test_config();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("reverse_proxy_auth_user"));
    }
}
