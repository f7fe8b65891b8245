//! Global runtime configuration.
//!
//! [`Config`] centralizes the settings of the supervision runtime. It can
//! be built in code or loaded from `CELLVISOR_*` environment variables via
//! [`Config::from_env`].

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::BackoffPolicy;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `poll_interval`: cadence of controller discovery polls
/// - `grace`: maximum wait for streams to stop during shutdown
///   (`0s` = do not wait, force immediately)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `backoff`: delay policy for reviving failed streams
/// - `connection_id` / `customer_id`: fleet-care topic coordinates
/// - `deployment`: optional deployment name stamped into factsheets
#[derive(Clone, Debug)]
pub struct Config {
    /// Cadence of controller discovery polls.
    pub poll_interval: Duration,

    /// Maximum time to wait for graceful shutdown before force-terminating.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// skip the oldest items.
    pub bus_capacity: usize,

    /// Backoff policy for reviving failed streams.
    pub backoff: BackoffPolicy,

    /// Gateway connection identifier on the fleet-care surface.
    pub connection_id: String,

    /// Customer identifier on the fleet-care surface.
    pub customer_id: String,

    /// Deployment name stamped into device factsheets.
    pub deployment: Option<String>,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `poll_interval = 30s` (discovery cadence)
    /// - `grace = 30s` (graceful shutdown window)
    /// - `bus_capacity = 1024`
    /// - `backoff = BackoffPolicy::default()` (5s first, doubling, 60s cap)
    /// - `connection_id = "cell"`, `customer_id = "local"`, no deployment
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
            connection_id: "cell".to_string(),
            customer_id: "local".to_string(),
            deployment: None,
        }
    }
}

impl Config {
    /// Loads configuration from `CELLVISOR_*` environment variables,
    /// falling back to defaults for unset ones.
    ///
    /// Recognized variables:
    /// - `CELLVISOR_POLL_INTERVAL_SECS`
    /// - `CELLVISOR_GRACE_SECS`
    /// - `CELLVISOR_BUS_CAPACITY`
    /// - `CELLVISOR_CONNECTION_ID`
    /// - `CELLVISOR_CUSTOMER_ID`
    /// - `CELLVISOR_DEPLOYMENT`
    ///
    /// SDK endpoint and credentials stay with the [`CellApi`]
    /// implementation; they are not part of the runtime's configuration.
    ///
    /// [`CellApi`]: crate::cell::CellApi
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(secs) = read_u64("CELLVISOR_POLL_INTERVAL_SECS")? {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = read_u64("CELLVISOR_GRACE_SECS")? {
            cfg.grace = Duration::from_secs(secs);
        }
        if let Some(cap) = read_u64("CELLVISOR_BUS_CAPACITY")? {
            cfg.bus_capacity = cap as usize;
        }
        if let Ok(v) = env::var("CELLVISOR_CONNECTION_ID") {
            cfg.connection_id = v;
        }
        if let Ok(v) = env::var("CELLVISOR_CUSTOMER_ID") {
            cfg.customer_id = v;
        }
        if let Ok(v) = env::var("CELLVISOR_DEPLOYMENT") {
            cfg.deployment = Some(v);
        }

        Ok(cfg)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

fn read_u64(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                value,
                reason: "expected a non-negative integer",
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.grace, Duration::from_secs(30));
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.connection_id, "cell");
        assert_eq!(cfg.customer_id, "local");
        assert!(cfg.deployment.is_none());
    }

    #[test]
    fn test_from_env_overrides_poll_interval() {
        let _env = env_guard();
        env::set_var("CELLVISOR_POLL_INTERVAL_SECS", "5");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        env::remove_var("CELLVISOR_POLL_INTERVAL_SECS");
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let _env = env_guard();
        env::set_var("CELLVISOR_GRACE_SECS", "soon");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "CELLVISOR_GRACE_SECS",
                ..
            }
        ));
        env::remove_var("CELLVISOR_GRACE_SECS");
    }

    #[test]
    fn test_from_env_reads_identity() {
        let _env = env_guard();
        env::set_var("CELLVISOR_DEPLOYMENT", "line-2");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.deployment.as_deref(), Some("line-2"));
        env::remove_var("CELLVISOR_DEPLOYMENT");
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let mut cfg = Config::default();
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
