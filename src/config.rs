//! Runtime configuration from environment variables (and `.env`)

use rust_decimal::Decimal;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Which [`BookingStore`](crate::store::BookingStore) backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Fraction of the base price charged as a service fee
    pub service_fee_rate: Decimal,
    pub currency: String,
}

impl Config {
    /// Load configuration, reading `.env` first when present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = match (store_backend, lookup("DATABASE_URL")) {
            (_, Some(url)) => url,
            (StoreBackend::Memory, None) => String::new(),
            (StoreBackend::Postgres, None) => return Err(ConfigError::Missing("DATABASE_URL")),
        };

        let service_fee_rate: Decimal =
            parse_or(&lookup, "SERVICE_FEE_RATE", Decimal::new(10, 2))?;
        if service_fee_rate < Decimal::ZERO || service_fee_rate >= Decimal::ONE {
            return Err(ConfigError::Invalid {
                key: "SERVICE_FEE_RATE",
                value: service_fee_rate.to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            store_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            service_fee_rate,
            currency: lookup("CURRENCY").unwrap_or_else(|| "USD".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_database_url() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/staybook")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.service_fee_rate, dec!(0.10));
        assert_eq!(config.currency, "USD");
        assert_eq!(config.db_max_connections, 10);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = config(&[("STORE_BACKEND", "memory"), ("SERVICE_FEE_RATE", "0")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.service_fee_rate, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("STORE_BACKEND", "redis")]).is_err());
        assert!(config(&[("STORE_BACKEND", "memory"), ("SERVICE_FEE_RATE", "1.5")]).is_err());
        assert!(config(&[("STORE_BACKEND", "memory"), ("BIND_ADDR", "nope")]).is_err());
    }
}
