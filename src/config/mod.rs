//! Configuration module for Mnemosyne.
//!
//! Loads settings from environment variables (and `.env`, if present).

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_TAG_PREFIX, StoreConfig};
use crate::error::{Error, Result};
use crate::utils::parse_duration;

const DEFAULT_STORE_CAPACITY: u64 = 10_000;
const DEFAULT_LOG_FILTER: &str = "mnemosyne=info";

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix of tag registry entries in the store.
    pub tag_prefix: String,

    /// Maximum number of entries kept by the in-memory store.
    pub store_capacity: u64,

    /// Idle timeout for in-memory store entries.
    pub store_tti: Option<Duration>,

    /// `tracing` filter directive used by the binary.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            store_capacity: DEFAULT_STORE_CAPACITY,
            store_tti: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Variables:
    /// - `MNEMOSYNE_TAG_PREFIX` (default `tag:`)
    /// - `MNEMOSYNE_STORE_CAPACITY` (default `10000`)
    /// - `MNEMOSYNE_STORE_TTI` (e.g. `30m`, unset means no idle timeout)
    /// - `MNEMOSYNE_LOG` (default `mnemosyne=info`)
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tag_prefix = var("MNEMOSYNE_TAG_PREFIX").unwrap_or(defaults.tag_prefix);

        let store_capacity = match var("MNEMOSYNE_STORE_CAPACITY") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("MNEMOSYNE_STORE_CAPACITY must be a number, got '{raw}'"))
            })?,
            None => defaults.store_capacity,
        };

        let store_tti = match var("MNEMOSYNE_STORE_TTI") {
            Some(raw) => Some(parse_duration(&raw).ok_or_else(|| {
                Error::Config(format!("MNEMOSYNE_STORE_TTI must look like 30m or 1h, got '{raw}'"))
            })?),
            None => None,
        };

        let log_filter = var("MNEMOSYNE_LOG").unwrap_or(defaults.log_filter);

        Ok(Self {
            tag_prefix,
            store_capacity,
            store_tti,
            log_filter,
        })
    }

    /// In-memory store configuration derived from these settings.
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::with_capacity(self.store_capacity);
        match self.store_tti {
            Some(tti) => config.tti(tti),
            None => config,
        }
    }
}
