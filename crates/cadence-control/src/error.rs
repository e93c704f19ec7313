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

//! Errors surfaced by the scheduler's fallible entry points.
//!
//! Nothing that happens inside the render loop becomes a [`SchedulerError`]:
//! paint failures and panics are logged and isolated there. Only building a
//! scheduler and spawning its thread can fail.

use thiserror::Error;

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// An error raised while configuring or starting the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The operating system refused to create the render thread.
    #[error("failed to spawn the render thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// A configuration value is out of range.
    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),
    /// A configuration document could not be parsed.
    #[error("failed to parse scheduler configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
