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

//! Lifecycle events published by the scheduler.

use cadence_core::{PaintError, TargetId};

/// Something noteworthy the scheduler did.
///
/// Delivered through a bounded channel; a consumer that falls behind misses
/// events rather than slowing the render loop down.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// The render thread entered its run body.
    WorkerStarted,
    /// The first target was registered; the loop is iterating.
    Activated,
    /// The last target left; the loop parks after its current frame.
    Idled,
    /// A target's paint returned an error or panicked.
    PaintFailed {
        /// The failing target.
        target: TargetId,
        /// What went wrong.
        error: PaintError,
    },
    /// Targets dropped by their owners were removed from the registry.
    TargetsPruned {
        /// How many entries were removed.
        count: usize,
    },
    /// A frame panicked outside of any paint call (e.g. in a frame handler).
    FramePanicked {
        /// The panic message, when one was available.
        message: String,
    },
}
