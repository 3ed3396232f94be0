use chrono::{Duration, FixedOffset, NaiveTime, Offset, Utc};
use std::env;
use std::str::FromStr;

// ============================================================================
// Application configuration
// ============================================================================
//
// Every value comes from an environment variable with a default. A value
// that is set but cannot be parsed stops start-up.
//
// ============================================================================

const MAX_CART_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// ScyllaDB contact point; `None` keeps everything in memory
    pub scylla_node: Option<String>,
    pub scylla_keyspace: String,
    pub metrics_port: u16,
    /// Carts untouched for at least this long are emptied by the sweep
    pub cart_ttl: Duration,
    /// Local time of day the sweep runs at
    pub cart_sweep_at: NaiveTime,
    /// Offset of the business location from UTC
    pub business_utc_offset: FixedOffset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scylla_node: None,
            scylla_keyspace: "delivery_ks".to_string(),
            metrics_port: 9090,
            cart_ttl: Duration::hours(24),
            cart_sweep_at: NaiveTime::MIN,
            business_utc_offset: Utc.fix(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scylla_node = lookup("SCYLLA_NODE").filter(|v| !v.trim().is_empty());
        let scylla_keyspace = lookup("SCYLLA_KEYSPACE").unwrap_or(defaults.scylla_keyspace);
        let metrics_port = parse_or(&lookup, "METRICS_PORT", defaults.metrics_port)?;

        let ttl_hours: i64 = parse_or(&lookup, "CART_TTL_HOURS", 24)?;
        if ttl_hours <= 0 || ttl_hours > MAX_CART_TTL_HOURS {
            return Err(ConfigError::InvalidValue {
                key: "CART_TTL_HOURS",
                message: format!("must be between 1 and {}, got {}", MAX_CART_TTL_HOURS, ttl_hours),
            });
        }

        let cart_sweep_at = match lookup("CART_SWEEP_AT") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
                key: "CART_SWEEP_AT",
                message: format!("expected HH:MM, got {:?}: {}", raw, e),
            })?,
            None => defaults.cart_sweep_at,
        };

        let offset_minutes: i32 = parse_or(&lookup, "BUSINESS_UTC_OFFSET_MINUTES", 0)?;
        let business_utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidValue {
                key: "BUSINESS_UTC_OFFSET_MINUTES",
                message: format!("out of range: {}", offset_minutes),
            })?;

        Ok(Self {
            scylla_node,
            scylla_keyspace,
            metrics_port,
            cart_ttl: Duration::hours(ttl_hours),
            cart_sweep_at,
            business_utc_offset,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            message: format!("{:?}: {}", raw, e),
        }),
        None => Ok(default),
    }
}
