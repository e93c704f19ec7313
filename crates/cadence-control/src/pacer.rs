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

//! Frame pacing: how long the render loop waits between frames.
//!
//! The pacer is pure arithmetic over durations; the loop measures time with
//! its [`Clock`](cadence_core::Clock) and performs the wait itself.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Frame rate used when nothing else is configured.
pub const DEFAULT_TARGET_FPS: u32 = 30;

/// Below this much remaining budget the loop yields instead of sleeping.
/// Sub-millisecond sleeps routinely overshoot on common schedulers.
pub const MIN_SLEEP: Duration = Duration::from_millis(1);

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A live-tunable, shared target frame rate.
///
/// Clones share the same value. The render loop re-reads it every frame, so
/// a change takes effect on the next frame at the latest.
#[derive(Debug, Clone)]
pub struct FrameRate(Arc<AtomicU32>);

impl FrameRate {
    /// Creates a frame rate handle with an initial value.
    pub fn new(fps: u32) -> Self {
        Self(Arc::new(AtomicU32::new(fps)))
    }

    /// Returns the current target in frames per second.
    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Sets a new target in frames per second. Zero is treated as 1 fps.
    pub fn set(&self, fps: u32) {
        self.0.store(fps, Ordering::Relaxed);
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_FPS)
    }
}

/// What the loop does with the rest of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Sleep for the given duration (an early wake just ends the frame sooner).
    Sleep(Duration),
    /// Give up the processor without sleeping.
    Yield,
}

/// Computes the wait at the end of each frame.
///
/// Besides the work done in the current frame, the pacer remembers how far
/// past their budget previous frames ran (sleep overshoot, slow paints) and
/// shortens upcoming waits to pay that back, so the mean frame interval
/// converges on the budget instead of drifting above it.
#[derive(Debug, Clone)]
pub struct FramePacer {
    min_sleep: Duration,
    debt: Duration,
}

impl FramePacer {
    /// Creates a pacer that yields whenever less than `min_sleep` remains.
    pub fn new(min_sleep: Duration) -> Self {
        Self {
            min_sleep,
            debt: Duration::ZERO,
        }
    }

    /// Returns the time allotted to one frame at `fps` frames per second.
    pub fn frame_budget(fps: u32) -> Duration {
        Duration::from_nanos(NANOS_PER_SEC / u64::from(fps.max(1)))
    }

    /// Feeds the measured interval between the last two frame starts.
    pub fn observe_interval(&mut self, fps: u32, interval: Duration) {
        let budget = Self::frame_budget(fps);
        self.debt = if interval >= budget {
            (self.debt + (interval - budget)).min(budget)
        } else {
            self.debt.saturating_sub(budget - interval)
        };
    }

    /// Decides how to finish a frame that spent `work` on handlers and paints.
    pub fn plan(&self, fps: u32, work: Duration) -> Pace {
        let remaining = Self::frame_budget(fps)
            .saturating_sub(work)
            .saturating_sub(self.debt);
        if remaining > self.min_sleep {
            Pace::Sleep(remaining)
        } else {
            Pace::Yield
        }
    }

    /// Forgets accumulated drift, e.g. after the loop was parked.
    pub fn reset(&mut self) {
        self.debt = Duration::ZERO;
    }

    /// Returns the drift the pacer is currently compensating for.
    pub fn debt(&self) -> Duration {
        self.debt
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(MIN_SLEEP)
    }
}
