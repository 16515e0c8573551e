use std::env;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub service_host: String,
    pub service_port: u16,
    pub redis_service_name: String,
    pub borrow_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_host = lookup("SERVICE_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let service_port = lookup("SERVICE_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let redis_service_name = lookup("REDIS_SERVICE_NAME")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "ha-redis".to_string());

        let borrow_timeout_ms = lookup("REDIS_BORROW_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .context("REDIS_BORROW_TIMEOUT_MS must be a whole number of milliseconds")?;

        Ok(Config {
            service_host,
            service_port,
            redis_service_name,
            borrow_timeout: Duration::from_millis(borrow_timeout_ms),
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Redis service binding: {}", self.redis_service_name);
        tracing::info!("  Pool borrow timeout: {:?}", self.borrow_timeout);
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_with_all_vars() {
        let config = config_from(&[
            ("SERVICE_HOST", "127.0.0.1"),
            ("SERVICE_PORT", "9090"),
            ("REDIS_SERVICE_NAME", "my-redis"),
            ("REDIS_BORROW_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.service_host, "127.0.0.1");
        assert_eq!(config.service_port, 9090);
        assert_eq!(config.redis_service_name, "my-redis");
        assert_eq!(config.borrow_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_config_with_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.service_host, "0.0.0.0");
        assert_eq!(config.service_port, 8080);
        assert_eq!(config.redis_service_name, "ha-redis");
        assert_eq!(config.borrow_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_platform_port_fallback() {
        let config = config_from(&[("PORT", "7000")]).unwrap();
        assert_eq!(config.service_port, 7000);

        // SERVICE_PORT wins over PORT
        let config = config_from(&[("PORT", "7000"), ("SERVICE_PORT", "7001")]).unwrap();
        assert_eq!(config.service_port, 7001);
    }

    #[test]
    fn test_invalid_port() {
        let result = config_from(&[("SERVICE_PORT", "not-a-number")]);
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.to_string().contains("SERVICE_PORT"));
    }

    #[test]
    fn test_port_out_of_range() {
        let result = config_from(&[("SERVICE_PORT", "99999")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_borrow_timeout() {
        let result = config_from(&[("REDIS_BORROW_TIMEOUT_MS", "soon")]);
        assert!(result.unwrap_err().to_string().contains("REDIS_BORROW_TIMEOUT_MS"));
    }

    #[test]
    fn test_empty_service_name_uses_default() {
        let config = config_from(&[("REDIS_SERVICE_NAME", "")]).unwrap();
        assert_eq!(config.redis_service_name, "ha-redis");
    }
}
