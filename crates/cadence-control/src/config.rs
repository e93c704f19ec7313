// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scheduler configuration.

use crate::error::{SchedulerError, SchedulerResult};
use crate::pacer::DEFAULT_TARGET_FPS;
use serde::{Deserialize, Serialize};

/// Configuration for the active render scheduler.
///
/// Missing fields fall back to their defaults when deserializing, so a host
/// can supply only the values it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Initial target frame rate in frames per second.
    /// The live value can be changed at any time through the scheduler's
    /// [`FrameRate`](crate::FrameRate) handle.
    pub target_fps: u32,
    /// Name given to the render thread.
    pub thread_name: String,
    /// Maximum number of undelivered lifecycle events.
    /// If the buffer is full, new events are dropped.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            thread_name: "cadence-render".to_string(),
            event_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a configuration from a JSON document.
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.target_fps == 0 {
            return Err(SchedulerError::InvalidConfig(
                "target_fps must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(SchedulerError::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(SchedulerError::InvalidConfig(
                "thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedulerConfig::default();
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.thread_name, "cadence-render");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = SchedulerConfig::from_json(r#"{ "target_fps": 60 }"#).unwrap();
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_from_json_rejects_zero_fps() {
        let err = SchedulerConfig::from_json(r#"{ "target_fps": 0 }"#).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = SchedulerConfig::from_json("{ target_fps: ").unwrap_err();
        assert!(matches!(err, SchedulerError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let config = SchedulerConfig {
            target_fps: 144,
            thread_name: "paint".to_string(),
            event_capacity: 8,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SchedulerConfig::from_json(&json).unwrap(), config);
    }
}
