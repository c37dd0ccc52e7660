use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::planner::DAILY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

pub const ENV_DAILY_CAPACITY: &str = "SPRINT_CAPACITY_DAILY_CAPACITY";
pub const ENV_HTTP_ADDR: &str = "SPRINT_CAPACITY_HTTP_ADDR";
pub const ENV_CACHE_CAPACITY: &str = "SPRINT_CAPACITY_CACHE_CAPACITY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    pub daily_capacity: i64,
    pub http_addr: String,
    pub cache_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            daily_capacity: DAILY_CAPACITY,
            http_addr: "0.0.0.0:3000".to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PlannerConfig {
    /// Missing keys fall back to the defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: PlannerConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps an environment variable name
    /// to its value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DAILY_CAPACITY) {
            self.daily_capacity = parse_value(ENV_DAILY_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = raw.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            self.cache_capacity = parse_value(ENV_CACHE_CAPACITY, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_capacity <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "dailyCapacity".into(),
                message: format!("must be positive (got {})", self.daily_capacity),
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cacheCapacity".into(),
                message: "must be at least 1".into(),
            });
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr
            .parse()
            .map_err(|err| ConfigError::InvalidValue {
                key: "httpAddr".into(),
                message: format!("'{}': {err}", self.http_addr),
            })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {err}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = PlannerConfig::default();
        assert_eq!(config.daily_capacity, 8);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dailyCapacity": 6}}"#).unwrap();
        let config = PlannerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.daily_capacity, 6);
        assert_eq!(config.http_addr, "0.0.0.0:3000");

        let config = config
            .with_env_overrides(env(&[
                (ENV_DAILY_CAPACITY, "10"),
                (ENV_HTTP_ADDR, "127.0.0.1:8080"),
            ]))
            .unwrap();
        assert_eq!(config.daily_capacity, 10);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn non_positive_capacity_is_rejected() {
        let err = PlannerConfig::default()
            .with_env_overrides(env(&[(ENV_DAILY_CAPACITY, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "dailyCapacity"));
    }

    #[test]
    fn unparsable_values_name_the_variable() {
        let err = PlannerConfig::default()
            .with_env_overrides(env(&[(ENV_CACHE_CAPACITY, "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CACHE_CAPACITY));
    }
}
