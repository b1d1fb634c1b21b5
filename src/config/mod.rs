use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

/// Upper bounds keep derived durations representable
const MAX_REFRESH_MARGIN_SECS: i64 = 86_400;
const MAX_COOKIE_AGE_DAYS: i64 = 400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub profiles: ProfileConfig,
    pub gate: GateConfig,
    pub cookies: CookieConfig,
    pub security: SecurityConfig,
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
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the hosted auth service (e.g. https://xyz.example.co)
    pub url: String,
    pub anon_key: String,
    pub request_timeout_secs: u64,
    /// Access tokens expiring within this window are refreshed up front
    pub refresh_margin_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileBackend {
    Rest,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub backend: ProfileBackend,
    pub table: String,
    /// REST backend: defaults to the identity service URL
    pub rest_url: Option<String>,
    /// REST backend: defaults to the anon key
    pub service_key: Option<String>,
    /// Postgres backend
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub login_path: String,
    pub dashboard_path: String,
    pub api_prefix: String,
    pub internal_asset_prefix: String,
    pub static_prefix: String,
    pub public_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    pub access_token_name: String,
    pub refresh_token_name: String,
    pub secure: bool,
    pub max_age_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Defaults for `APP_ENV`, then the optional YAML file, then env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("DASHBOARD_CONFIG_FILE") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::for_environment(Self::environment_from(env::var("APP_ENV").ok().as_deref())),
        };

        let config = base.with_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn environment_from(value: Option<&str>) -> Environment {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Identity overrides
        if let Some(v) = lookup("IDENTITY_URL") {
            self.identity.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("IDENTITY_ANON_KEY") {
            self.identity.anon_key = v;
        }
        if let Some(v) = lookup("IDENTITY_TIMEOUT_SECS") {
            self.identity.request_timeout_secs = v.parse().unwrap_or(self.identity.request_timeout_secs);
        }
        if let Some(v) = lookup("IDENTITY_REFRESH_MARGIN_SECS") {
            self.identity.refresh_margin_secs = v.parse().unwrap_or(self.identity.refresh_margin_secs);
        }

        // Profile store overrides
        if let Some(v) = lookup("PROFILE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "rest" => self.profiles.backend = ProfileBackend::Rest,
                "postgres" | "pg" => self.profiles.backend = ProfileBackend::Postgres,
                _ => tracing::warn!("Ignoring unknown PROFILE_BACKEND '{}'", v),
            }
        }
        if let Some(v) = lookup("PROFILE_TABLE") {
            self.profiles.table = v;
        }
        if let Some(v) = lookup("PROFILE_REST_URL") {
            self.profiles.rest_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = lookup("PROFILE_SERVICE_KEY") {
            self.profiles.service_key = Some(v);
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.profiles.database_url = Some(v);
        }

        // Gate overrides
        if let Some(v) = lookup("GATE_LOGIN_PATH") {
            self.gate.login_path = v;
        }
        if let Some(v) = lookup("GATE_DASHBOARD_PATH") {
            self.gate.dashboard_path = v;
        }

        // Cookie overrides
        if let Some(v) = lookup("COOKIE_ACCESS_TOKEN_NAME") {
            self.cookies.access_token_name = v;
        }
        if let Some(v) = lookup("COOKIE_REFRESH_TOKEN_NAME") {
            self.cookies.refresh_token_name = v;
        }
        if let Some(v) = lookup("COOKIE_SECURE") {
            self.cookies.secure = v.parse().unwrap_or(self.cookies.secure);
        }
        if let Some(v) = lookup("COOKIE_MAX_AGE_DAYS") {
            self.cookies.max_age_days = v.parse().unwrap_or(self.cookies.max_age_days);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.url.is_empty() {
            return Err(ConfigError::Missing("IDENTITY_URL"));
        }
        url::Url::parse(&self.identity.url).map_err(|e| ConfigError::Invalid {
            key: "IDENTITY_URL",
            message: e.to_string(),
        })?;

        if self.profiles.backend == ProfileBackend::Postgres && self.profiles.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        if !(0..=MAX_REFRESH_MARGIN_SECS).contains(&self.identity.refresh_margin_secs) {
            return Err(ConfigError::Invalid {
                key: "IDENTITY_REFRESH_MARGIN_SECS",
                message: format!("must be between 0 and {}", MAX_REFRESH_MARGIN_SECS),
            });
        }
        if !(0..=MAX_COOKIE_AGE_DAYS).contains(&self.cookies.max_age_days) {
            return Err(ConfigError::Invalid {
                key: "COOKIE_MAX_AGE_DAYS",
                message: format!("must be between 0 and {}", MAX_COOKIE_AGE_DAYS),
            });
        }

        for (key, path) in [
            ("GATE_LOGIN_PATH", &self.gate.login_path),
            ("GATE_DASHBOARD_PATH", &self.gate.dashboard_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    key,
                    message: format!("'{}' must start with '/'", path),
                });
            }
        }

        Ok(())
    }

    /// Base URL the REST profile store talks to
    pub fn profile_rest_url(&self) -> &str {
        self.profiles.rest_url.as_deref().unwrap_or(&self.identity.url)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                enable_request_logging: true,
            },
            identity: IdentityConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                request_timeout_secs: 10,
                refresh_margin_secs: 60,
            },
            profiles: ProfileConfig::default(),
            gate: GateConfig::default(),
            cookies: CookieConfig {
                secure: false,
                ..CookieConfig::default()
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: true,
            },
            identity: IdentityConfig {
                url: String::new(),
                anon_key: String::new(),
                request_timeout_secs: 10,
                refresh_margin_secs: 60,
            },
            profiles: ProfileConfig::default(),
            gate: GateConfig::default(),
            cookies: CookieConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: false,
            },
            identity: IdentityConfig {
                url: String::new(),
                anon_key: String::new(),
                request_timeout_secs: 5,
                refresh_margin_secs: 90,
            },
            profiles: ProfileConfig::default(),
            gate: GateConfig::default(),
            cookies: CookieConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            backend: ProfileBackend::Rest,
            table: "profiles".to_string(),
            rest_url: None,
            service_key: None,
            database_url: None,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            api_prefix: "/api".to_string(),
            internal_asset_prefix: "/_next".to_string(),
            static_prefix: "/static".to_string(),
            public_prefixes: ["/login", "/signup", "/forgot-password", "/reset-password"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_token_name: "sb-access-token".to_string(),
            refresh_token_name: "sb-refresh-token".to_string(),
            secure: true,
            max_age_days: 400,
        }
    }
}

#[macro_export]
macro_rules! is_production {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Production)
    };
}
