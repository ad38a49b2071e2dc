//! Process configuration read from the environment (and `.env` via dotenvy).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BASE_PATH: &str = "/api";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "production" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }

    /// Environment named by `APP_ENV`; development when unset or unrecognised.
    pub fn current() -> Self {
        std::env::var("APP_ENV")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub database_url: Option<String>,
    pub base_path: String,
    pub resources_path: Option<PathBuf>,
}

impl AppConfig {
    /// Read `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("APP_ENV") {
            None => Environment::default(),
            Some(v) => Environment::parse(&v).ok_or_else(|| ConfigError::Env {
                name: "APP_ENV",
                reason: format!("expected development, production or test, got '{}'", v),
            })?,
        };

        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(v) => match v.parse::<u16>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    return Err(ConfigError::Env {
                        name: "PORT",
                        reason: format!("expected a port number between 1 and 65535, got '{}'", v),
                    })
                }
            },
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| {
            if environment.is_production() {
                "info".into()
            } else {
                "debug".into()
            }
        });

        let cors_origins: Vec<String> = get("CORS_ORIGIN")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if cors_origins.is_empty() {
            return Err(ConfigError::Env {
                name: "CORS_ORIGIN",
                reason: "at least one origin is required".into(),
            });
        }

        let base_path = normalize_base_path(&get("API_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.into()));

        Ok(AppConfig {
            environment,
            port,
            log_level,
            cors_origins,
            database_url: get("DATABASE_URL"),
            base_path,
            resources_path: get("RESOURCES_PATH").map(PathBuf::from),
        })
    }

    /// Filter directive for tracing-subscriber: this crate and the binary at `log_level`.
    pub fn env_filter_directive(&self) -> String {
        format!("tenant_crud={lvl},example_consumer={lvl},tower_http={lvl}", lvl = self.log_level)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            environment: Environment::Development,
            port: DEFAULT_PORT,
            log_level: "debug".into(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.into()],
            database_url: None,
            base_path: DEFAULT_BASE_PATH.into(),
            resources_path: None,
        }
    }
}

/// Leading slash, no trailing slash. `/` becomes the empty prefix.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]).unwrap();
        assert_eq!(c, AppConfig::default());
    }

    #[test]
    fn production_logs_at_info() {
        let c = config(&[("APP_ENV", "production")]).unwrap();
        assert!(c.environment.is_production());
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn splits_cors_origins() {
        let c = config(&[("CORS_ORIGIN", "http://a.test, http://b.test,")]).unwrap();
        assert_eq!(c.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn rejects_bad_values_naming_the_variable() {
        for (name, value) in [("PORT", "0"), ("PORT", "http"), ("APP_ENV", "staging"), ("CORS_ORIGIN", ",")] {
            match config(&[(name, value)]) {
                Err(ConfigError::Env { name: n, .. }) => assert_eq!(n, name),
                other => panic!("expected env error for {}={}, got {:?}", name, value, other),
            }
        }
    }

    #[test]
    fn normalizes_base_path() {
        assert_eq!(config(&[("API_BASE_PATH", "v1/")]).unwrap().base_path, "/v1");
        assert_eq!(config(&[("API_BASE_PATH", "/")]).unwrap().base_path, "");
    }
}
