//! Registry tuning
//!
//! The tick interval and the liveness multiplier together decide how fast a
//! closed window disappears from the others (at most `deadline + interval`)
//! and how much timer jitter a live window survives. Background tabs get
//! their timers throttled by the browser, so the deadline must span several
//! intervals.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Default namespace prefix of the registry key
pub const DEFAULT_NAMESPACE: &str = "winsync";

/// Default heartbeat period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 250;

/// Default number of intervals a window may miss before it is evicted
pub const DEFAULT_LIVENESS_MULTIPLIER: u32 = 4;

/// Smallest multiplier accepted by [`RegistryConfig::validate`]
pub const MIN_LIVENESS_MULTIPLIER: u32 = 2;

/// Registry configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Prefix of the store key; isolates applications sharing a store
    pub namespace: String,
    /// Heartbeat period
    pub tick_interval_ms: u64,
    /// Liveness deadline as a multiple of the tick interval
    pub liveness_multiplier: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            liveness_multiplier: DEFAULT_LIVENESS_MULTIPLIER,
        }
    }
}

impl RegistryConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_liveness_multiplier(mut self, multiplier: u32) -> Self {
        self.liveness_multiplier = multiplier;
        self
    }

    /// Time without refresh after which a descriptor is dead.
    pub fn liveness_deadline_ms(&self) -> u64 {
        self.tick_interval_ms
            .saturating_mul(u64::from(self.liveness_multiplier))
    }

    /// Parse a JSON config object. Missing fields take their defaults.
    ///
    /// Only an object is accepted; serde would otherwise read `[]` as an
    /// all-default struct.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("registry config must be a JSON object"));
        }
        serde_json::from_value(value)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if self.namespace.is_empty() {
            return Err(RegistryError::InvalidConfig {
                field: "namespace",
                reason: "must not be empty",
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(RegistryError::InvalidConfig {
                field: "tick_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.liveness_multiplier < MIN_LIVENESS_MULTIPLIER {
            return Err(RegistryError::InvalidConfig {
                field: "liveness_multiplier",
                reason: "must be at least 2",
            });
        }
        Ok(())
    }
}
