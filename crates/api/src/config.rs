//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::Currency;

/// Credentials and base URL of the external payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub key_id: String,
    pub key_secret: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `plain` or `json` (default: `plain`)
/// - `DATABASE_URL`: PostgreSQL URL; unset keeps documents in memory
/// - `INVENTORY_URL` / `CART_URL`: remote components; unset runs them in-process
/// - `PAYMENT_GATEWAY_URL`, `PAYMENT_GATEWAY_KEY_ID`, `PAYMENT_GATEWAY_KEY_SECRET`
///   for the external gateway; unset uses the in-memory gateway
/// - `PAYMENT_CURRENCY`: settlement currency (default: `INR`)
/// - `SETTLE_STOCK_ON_CAPTURE`: decrement stock again on capture (default: `true`)
/// - `REMOTE_TIMEOUT_SECS`: timeout for outgoing HTTP calls (default: none)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub database_url: Option<String>,
    pub inventory_url: Option<String>,
    pub cart_url: Option<String>,
    pub gateway: Option<GatewayConfig>,
    pub currency: Currency,
    pub settle_stock_on_capture: bool,
    pub remote_timeout: Option<Duration>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let gateway = match (
            non_empty("PAYMENT_GATEWAY_URL"),
            non_empty("PAYMENT_GATEWAY_KEY_ID"),
            non_empty("PAYMENT_GATEWAY_KEY_SECRET"),
        ) {
            (Some(url), Some(key_id), Some(key_secret)) => Some(GatewayConfig {
                url,
                key_id,
                key_secret,
            }),
            _ => None,
        };

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: non_empty("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: non_empty("DATABASE_URL"),
            inventory_url: non_empty("INVENTORY_URL"),
            cart_url: non_empty("CART_URL"),
            gateway,
            currency: non_empty("PAYMENT_CURRENCY")
                .map(Currency::new)
                .unwrap_or(defaults.currency),
            settle_stock_on_capture: non_empty("SETTLE_STOCK_ON_CAPTURE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.settle_stock_on_capture),
            remote_timeout: non_empty("REMOTE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            json_logs: false,
            database_url: None,
            inventory_url: None,
            cart_url: None,
            gateway: None,
            currency: Currency::inr(),
            settle_stock_on_capture: true,
            remote_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_pairs(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert!(config.database_url.is_none());
        assert!(config.gateway.is_none());
        assert_eq!(config.currency, Currency::inr());
        assert!(config.settle_stock_on_capture);
        assert!(config.remote_timeout.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("PORT", "8081"),
            ("LOG_FORMAT", "JSON"),
            ("INVENTORY_URL", "http://inventory:3000"),
            ("PAYMENT_CURRENCY", "usd"),
            ("SETTLE_STOCK_ON_CAPTURE", "off"),
            ("REMOTE_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(config.port, 8081);
        assert!(config.json_logs);
        assert_eq!(config.inventory_url.as_deref(), Some("http://inventory:3000"));
        assert_eq!(config.currency.code(), "USD");
        assert!(!config.settle_stock_on_capture);
        assert_eq!(config.remote_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_gateway_needs_all_three_settings() {
        let partial = from_pairs(&[
            ("PAYMENT_GATEWAY_URL", "https://api.gateway.test"),
            ("PAYMENT_GATEWAY_KEY_ID", "key"),
        ]);
        assert!(partial.gateway.is_none());

        let full = from_pairs(&[
            ("PAYMENT_GATEWAY_URL", "https://api.gateway.test"),
            ("PAYMENT_GATEWAY_KEY_ID", "key"),
            ("PAYMENT_GATEWAY_KEY_SECRET", "secret"),
        ]);
        assert_eq!(full.gateway.unwrap().key_id, "key");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[("PORT", "not-a-port"), ("SETTLE_STOCK_ON_CAPTURE", "maybe")]);
        assert_eq!(config.port, 3000);
        assert!(config.settle_stock_on_capture);
    }
}
