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

//! The body of the render thread.

use crate::event::SchedulerEvent;
use crate::lifecycle::Resume;
use crate::metrics::{FrameMetrics, FrameReport};
use crate::pacer::{FramePacer, Pace};
use crate::registry::Change;
use crate::service::Shared;
use cadence_core::{PaintError, RenderTarget, TargetId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::thread;

/// Runs the render loop until the scheduler is torn down.
pub(crate) fn run(shared: Arc<Shared>) {
    let _ = shared.worker_id.set(thread::current().id());
    shared.events.publish(SchedulerEvent::WorkerStarted);
    shared.latch.release();
    log::info!(
        "Render thread started (target: {} fps).",
        shared.frame_rate.get()
    );

    let mut pacer = FramePacer::default();
    let mut last_start = shared.clock.now();

    loop {
        let resumed = match shared.targets.wait_active() {
            Resume::Shutdown => break,
            Resume::Running => false,
            Resume::Resumed => {
                log::debug!("Render loop resumed.");
                pacer.reset();
                true
            }
        };

        let fps = shared.frame_rate.get();
        let start = shared.clock.now();
        let interval = start.saturating_sub(last_start);
        last_start = start;

        // The first frame after a park would report the whole idle period.
        if !resumed {
            pacer.observe_interval(fps, interval);
            lock_stats(&shared).record_interval(interval);
        }

        let elapsed_ns = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX);
        match panic::catch_unwind(AssertUnwindSafe(|| run_frame(&shared, elapsed_ns))) {
            Ok(report) => lock_stats(&shared).record_frame(&report),
            Err(payload) => {
                let message = match PaintError::from_panic(payload.as_ref()) {
                    PaintError::Panicked(message) => message,
                    other => other.to_string(),
                };
                log::error!("Frame panicked, continuing: {}", message);
                lock_stats(&shared).record_panic();
                shared
                    .events
                    .publish(SchedulerEvent::FramePanicked { message });
            }
        }

        let work = shared.clock.now().saturating_sub(start);
        match pacer.plan(fps, work) {
            Pace::Sleep(duration) => shared.targets.gate().pause(duration),
            Pace::Yield => thread::yield_now(),
        }
    }

    log::info!("Render thread stopped.");
}

/// One frame: run the handlers, then paint every target.
fn run_frame(shared: &Shared, elapsed_ns: u64) -> FrameReport {
    for entry in shared.handlers.snapshot().iter() {
        if let Some(handler) = entry.upgrade() {
            handler.on_frame(elapsed_ns);
        }
    }

    let mut report = FrameReport::default();
    let mut dead = Vec::new();
    for entry in shared.targets.snapshot().iter() {
        let Some(target) = entry.upgrade() else {
            dead.push(entry.id());
            continue;
        };
        if !target.is_displayable() {
            report.skipped += 1;
            continue;
        }
        match paint(target.as_ref()) {
            Ok(()) => report.painted += 1,
            Err(error) => {
                report.failed += 1;
                match &error {
                    PaintError::Panicked(_) => {
                        log::error!("Target '{}' panicked while painting: {}", target.label(), error)
                    }
                    _ => log::warn!("Target '{}' failed to paint: {}", target.label(), error),
                }
                shared.events.publish(SchedulerEvent::PaintFailed {
                    target: entry.id(),
                    error,
                });
            }
        }
    }

    if !dead.is_empty() {
        prune(shared, &dead);
    }
    report
}

fn paint(target: &dyn RenderTarget) -> Result<(), PaintError> {
    panic::catch_unwind(AssertUnwindSafe(|| target.paint()))
        .unwrap_or_else(|payload| Err(PaintError::from_panic(payload.as_ref())))
}

/// Drops entries whose owners released the target.
fn prune(shared: &Shared, dead: &[TargetId]) {
    let change = shared.targets.remove_ids_then(dead, |change| {
        shared
            .events
            .publish(SchedulerEvent::TargetsPruned { count: dead.len() });
        if change == Change::Idled {
            shared.events.publish(SchedulerEvent::Idled);
        }
    });
    if !change.is_changed() {
        return;
    }
    log::debug!("Pruned {} dropped render target(s).", dead.len());
    if change == Change::Idled {
        log::info!("Last render target dropped, render loop going idle.");
    }
}

fn lock_stats(shared: &Shared) -> MutexGuard<'_, FrameMetrics> {
    shared.stats.lock().unwrap_or_else(PoisonError::into_inner)
}
