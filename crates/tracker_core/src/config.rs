use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Tunables for the progress, preview and submission controllers.
///
/// Every field has a default, so a config file only needs the values it
/// overrides. Durations are given in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Progress shown when a job is submitted and the floor applied on start.
    pub initial_progress: u8,
    /// Consecutive poll failures tolerated before simulation takes over.
    pub poll_failure_threshold: u32,
    /// Simulated job progress stays strictly below this value.
    pub simulation_cap: u8,
    /// Simulated preview progress never exceeds this value.
    pub preview_cap: u8,
    pub preview_step_min: u8,
    pub preview_step_max: u8,
    pub poll_interval_ms: u64,
    pub safety_timeout_ms: u64,
    /// Time the final percentage stays visible before an error/overflow finish.
    pub final_display_delay_ms: u64,
    pub preview_tick_ms: u64,
    pub preview_success_delay_ms: u64,
    pub preview_error_delay_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            initial_progress: 5,
            poll_failure_threshold: 5,
            simulation_cap: 95,
            preview_cap: 90,
            preview_step_min: 2,
            preview_step_max: 8,
            poll_interval_ms: 1_000,
            safety_timeout_ms: 60_000,
            final_display_delay_ms: 1_000,
            preview_tick_ms: 250,
            preview_success_delay_ms: 800,
            preview_error_delay_ms: 400,
        }
    }
}

impl TrackerConfig {
    /// Rejects values the timers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("poll_interval_ms"));
        }
        if self.preview_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval("preview_tick_ms"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn safety_timeout(&self) -> Duration {
        Duration::from_millis(self.safety_timeout_ms)
    }

    pub fn final_display_delay(&self) -> Duration {
        Duration::from_millis(self.final_display_delay_ms)
    }

    pub fn preview_tick(&self) -> Duration {
        Duration::from_millis(self.preview_tick_ms)
    }

    pub fn preview_success_delay(&self) -> Duration {
        Duration::from_millis(self.preview_success_delay_ms)
    }

    pub fn preview_error_delay(&self) -> Duration {
        Duration::from_millis(self.preview_error_delay_ms)
    }

    /// Highest value the job simulation may display while polling.
    pub(crate) fn simulation_ceiling(&self) -> u8 {
        self.simulation_cap.saturating_sub(1).min(99)
    }

    /// Inclusive step range for the preview illusion, tolerating swapped bounds.
    pub(crate) fn preview_step_range(&self) -> (u8, u8) {
        let low = self.preview_step_min.max(1);
        let high = self.preview_step_max.max(low);
        (low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TrackerConfig};

    #[test]
    fn ceiling_sits_below_cap() {
        let config = TrackerConfig::default();
        assert_eq!(config.simulation_ceiling(), 94);

        let zero = TrackerConfig {
            simulation_cap: 0,
            ..TrackerConfig::default()
        };
        assert_eq!(zero.simulation_ceiling(), 0);
    }

    #[test]
    fn preview_steps_are_normalized() {
        let config = TrackerConfig {
            preview_step_min: 0,
            preview_step_max: 0,
            ..TrackerConfig::default()
        };
        assert_eq!(config.preview_step_range(), (1, 1));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: TrackerConfig = ron::from_str("(poll_failure_threshold: 3)").unwrap();
        assert_eq!(config.poll_failure_threshold, 3);
        assert_eq!(config.safety_timeout_ms, 60_000);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        assert_eq!(TrackerConfig::default().validate(), Ok(()));

        let config: TrackerConfig = ron::from_str("(poll_interval_ms: 0)").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroInterval("poll_interval_ms"))
        );
        let config: TrackerConfig = ron::from_str("(preview_tick_ms: 0)").unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval("preview_tick_ms")));
    }
}
