//! Store configuration, read from the environment (and `.env` when present).

use crate::error::{StoreError, StoreResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    /// Inclusive bounds for a single add-to-cart quantity.
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub page_size: u32,
    pub order_number_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://storefront.db".to_string(),
            max_connections: 4,
            busy_timeout: Duration::from_millis(5000),
            min_quantity: 1,
            max_quantity: 999,
            page_size: 20,
            order_number_prefix: "CS".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> StoreResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            database_url: lookup("STOREFRONT_DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(&lookup, "STOREFRONT_MAX_CONNECTIONS", defaults.max_connections)?,
            busy_timeout: Duration::from_millis(parse_or(
                &lookup,
                "STOREFRONT_BUSY_TIMEOUT_MS",
                defaults.busy_timeout.as_millis() as u64,
            )?),
            min_quantity: parse_or(&lookup, "STOREFRONT_MIN_QUANTITY", defaults.min_quantity)?,
            max_quantity: parse_or(&lookup, "STOREFRONT_MAX_QUANTITY", defaults.max_quantity)?,
            page_size: parse_or(&lookup, "STOREFRONT_PAGE_SIZE", defaults.page_size)?,
            order_number_prefix: lookup("STOREFRONT_ORDER_PREFIX").unwrap_or(defaults.order_number_prefix),
        };
        config.validate()?;
        tracing::debug!(max_connections = config.max_connections, "Store configuration loaded");
        Ok(config)
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    fn validate(&self) -> StoreResult<()> {
        if self.max_connections == 0 {
            return Err(StoreError::Config("STOREFRONT_MAX_CONNECTIONS must be at least 1".into()));
        }
        if self.min_quantity < 1 || self.min_quantity > self.max_quantity {
            return Err(StoreError::Config(format!(
                "Invalid quantity range {}..={}",
                self.min_quantity, self.max_quantity
            )));
        }
        if self.order_number_prefix.trim().is_empty() {
            return Err(StoreError::Config("STOREFRONT_ORDER_PREFIX cannot be blank".into()));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| StoreError::Config(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.max_quantity, 999);
        assert_eq!(config.order_number_prefix, "CS");
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_DATABASE_URL", "sqlite::memory:"),
            ("STOREFRONT_MAX_QUANTITY", "10"),
            ("STOREFRONT_BUSY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_quantity, 10);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            StoreConfig::from_lookup(lookup_from(&[("STOREFRONT_PAGE_SIZE", "lots")])),
            Err(StoreError::Config(_))
        ));
        assert!(matches!(
            StoreConfig::from_lookup(lookup_from(&[("STOREFRONT_MIN_QUANTITY", "5"), ("STOREFRONT_MAX_QUANTITY", "2")])),
            Err(StoreError::Config(_))
        ));
    }
}
