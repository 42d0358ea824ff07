//! Scheduler configuration
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! pool_capacity = 64
//! prewarm = 8
//! default_easing = "cubic_out"
//! ```

use serde::{Deserialize, Serialize};

use crate::easing::EasingKind;
use crate::error::{Result, TweenError};

/// Tuning knobs for a [`TweenScheduler`](crate::scheduler::TweenScheduler)
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Idle instances retained per value type
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Instances allocated up front for each built-in value type
    #[serde(default)]
    pub prewarm: usize,
    /// Curve used when a request names none
    #[serde(default)]
    pub default_easing: EasingKind,
}

fn default_pool_capacity() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
            prewarm: 0,
            default_easing: EasingKind::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(source)?;
        config.validate()?;
        tracing::debug!(
            pool_capacity = config.pool_capacity,
            prewarm = config.prewarm,
            default_easing = ?config.default_easing,
            "loaded scheduler config"
        );
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| TweenError::InvalidConfig(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.prewarm > self.pool_capacity {
            return Err(TweenError::InvalidConfig(format!(
                "prewarm ({}) exceeds pool_capacity ({})",
                self.prewarm, self.pool_capacity
            )));
        }
        Ok(())
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn with_prewarm(mut self, prewarm: usize) -> Self {
        self.prewarm = prewarm;
        self
    }

    pub fn with_default_easing(mut self, easing: EasingKind) -> Self {
        self.default_easing = easing;
        self
    }
}
