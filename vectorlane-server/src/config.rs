//! Environment configuration of the simulator binary.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const ADDR_VAR: &str = "VECTORLANE_ADDR";
pub const TASK_MILLIS_VAR: &str = "VECTORLANE_TASK_MILLIS";

pub const DEFAULT_ADDR: &str = "0.0.0.0:19530";
pub const DEFAULT_TASK_MILLIS: u64 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid value: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Listen address and simulated task duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub task_duration: Duration,
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr.parse().map_err(|_| ConfigError::Invalid {
            var: ADDR_VAR,
            value: addr.clone(),
        })?;

        let millis = match lookup(TASK_MILLIS_VAR) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: TASK_MILLIS_VAR,
                value,
            })?,
            None => DEFAULT_TASK_MILLIS,
        };

        Ok(Self {
            addr,
            task_duration: Duration::from_millis(millis),
        })
    }
}
