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

//! # Cadence Control
//!
//! The active render scheduler: one dedicated thread that paints every
//! registered [`RenderTarget`](cadence_core::RenderTarget) at a fixed,
//! live-tunable frame rate, and parks when there is nothing to paint.
//!
//! Most hosts use the process-wide instance from [`global`]. Tests and
//! embedders that need isolation build their own [`Scheduler`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod metrics;
pub mod pacer;
pub mod registry;
pub mod service;

mod worker;

pub use config::SchedulerConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use event::SchedulerEvent;
pub use lifecycle::{SchedulerState, StartPhase};
pub use metrics::FrameStats;
pub use pacer::{FrameRate, DEFAULT_TARGET_FPS};
pub use service::{Scheduler, SchedulerBuilder};

use std::sync::OnceLock;

static GLOBAL: OnceLock<Scheduler> = OnceLock::new();

/// Returns the process-wide scheduler, creating it with the default
/// configuration on first use.
///
/// The instance is never dropped; its render thread parks when idle.
pub fn global() -> &'static Scheduler {
    GLOBAL.get_or_init(Scheduler::new)
}

/// Installs `scheduler` as the process-wide instance.
///
/// Must run before the first call to [`global`]. Hands the scheduler back
/// if an instance already exists.
pub fn install_global(scheduler: Scheduler) -> Result<(), Scheduler> {
    GLOBAL.set(scheduler)
}
