//! Configuration loading and representation.

use std::time::Duration;

use thiserror::Error;

use optica_observability::LogFormat;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from `OPTICA_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub search_debounce: Duration,
    pub document_debounce: Duration,
    pub toast_duration: Duration,
    pub toast_stagger: Duration,
    pub inventory_page_size: u32,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            search_debounce: Duration::from_millis(300),
            document_debounce: Duration::from_millis(150),
            toast_duration: Duration::from_millis(2500),
            toast_stagger: Duration::from_millis(500),
            inventory_page_size: 100,
            log_json: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("OPTICA_BACKEND_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    name: "OPTICA_BACKEND_URL",
                    value: url,
                    reason: "expected an http(s) URL".to_string(),
                });
            }
            config.backend_url = url;
        }

        let millis = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(name) {
                Some(raw) => parse::<u64>(name, &raw).map(Duration::from_millis),
                None => Ok(default),
            }
        };
        config.search_debounce = millis("OPTICA_SEARCH_DEBOUNCE_MS", config.search_debounce)?;
        config.document_debounce = millis("OPTICA_DOCUMENT_DEBOUNCE_MS", config.document_debounce)?;
        config.toast_duration = millis("OPTICA_TOAST_DURATION_MS", config.toast_duration)?;
        config.toast_stagger = millis("OPTICA_TOAST_STAGGER_MS", config.toast_stagger)?;

        if let Some(raw) = lookup("OPTICA_INVENTORY_PAGE_SIZE") {
            let size = parse::<u32>("OPTICA_INVENTORY_PAGE_SIZE", &raw)?;
            if size == 0 {
                return Err(ConfigError::Invalid {
                    name: "OPTICA_INVENTORY_PAGE_SIZE",
                    value: raw,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.inventory_page_size = size;
        }

        if let Some(raw) = lookup("OPTICA_LOG_JSON") {
            config.log_json = parse::<bool>("OPTICA_LOG_JSON", &raw)?;
        }

        Ok(config)
    }

    /// Install the process log in the configured format.
    pub fn init_logging(&self) {
        optica_observability::init_with(LogFormat::from_json_flag(self.log_json));
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("OPTICA_BACKEND_URL", "https://api.optica.uy/"),
            ("OPTICA_SEARCH_DEBOUNCE_MS", "250"),
            ("OPTICA_LOG_JSON", "false"),
            ("OPTICA_INVENTORY_PAGE_SIZE", "25"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "https://api.optica.uy");
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.document_debounce, Duration::from_millis(150));
        assert!(!config.log_json);
        assert_eq!(config.inventory_page_size, 25);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("OPTICA_TOAST_DURATION_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "OPTICA_TOAST_DURATION_MS", .. }));

        assert!(Config::from_lookup(lookup(&[("OPTICA_BACKEND_URL", "localhost")])).is_err());
        assert!(Config::from_lookup(lookup(&[("OPTICA_INVENTORY_PAGE_SIZE", "0")])).is_err());
    }

    #[test]
    fn logging_can_be_installed_from_config() {
        let config = Config::from_lookup(lookup(&[("OPTICA_LOG_JSON", "false")])).unwrap();
        config.init_logging();
        config.init_logging();
    }
}
