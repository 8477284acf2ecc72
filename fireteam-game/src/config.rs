//! Run parameters chosen before the first mission.
use crate::constants::{DEFAULT_MISSION_QUOTA, MAX_MISSION_QUOTA, MIN_MISSION_QUOTA};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Missions to attempt before extraction.
    #[serde(default = "RunConfig::default_mission_quota")]
    pub mission_quota: u32,
}

impl RunConfig {
    #[must_use]
    pub const fn default_mission_quota() -> u32 {
        DEFAULT_MISSION_QUOTA
    }

    #[must_use]
    pub const fn with_quota(mission_quota: u32) -> Self {
        Self { mission_quota }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `RunConfigError` when the quota is outside the supported range.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        if !(MIN_MISSION_QUOTA..=MAX_MISSION_QUOTA).contains(&self.mission_quota) {
            return Err(RunConfigError::QuotaOutOfRange {
                min: MIN_MISSION_QUOTA,
                max: MAX_MISSION_QUOTA,
                value: self.mission_quota,
            });
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mission_quota: Self::default_mission_quota(),
        }
    }
}

/// Errors raised when run configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunConfigError {
    #[error("mission_quota must be between {min} and {max} (got {value})")]
    QuotaOutOfRange { min: u32, max: u32, value: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cfg.mission_quota, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn quota_bounds_are_enforced() {
        assert!(RunConfig::with_quota(1).validate().is_ok());
        assert!(RunConfig::with_quota(10).validate().is_ok());
        let err = RunConfig::with_quota(0).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "mission_quota must be between 1 and 10 (got 0)"
        );
        assert!(RunConfig::with_quota(11).validate().is_err());
    }
}
