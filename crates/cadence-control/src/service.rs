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

//! The active render scheduler.

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::event::SchedulerEvent;
use crate::lifecycle::{SchedulerState, StartLatch, StartPhase};
use crate::metrics::{FrameMetrics, FrameStats};
use crate::pacer::FrameRate;
use crate::registry::{Change, HandlerRegistry, TargetRegistry};
use crate::worker;
use cadence_core::{
    Clock, EventBus, FrameHandler, ImmediateUiThread, MonotonicClock, RenderTarget, UiThread,
};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

/// State shared between the [`Scheduler`] handle and its render thread.
pub(crate) struct Shared {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) frame_rate: FrameRate,
    pub(crate) targets: TargetRegistry,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) latch: StartLatch,
    pub(crate) worker_id: OnceLock<ThreadId>,
    pub(crate) stats: Mutex<FrameMetrics>,
    pub(crate) events: EventBus<SchedulerEvent>,
}

/// Builds a [`Scheduler`] with injected collaborators.
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    ui: Arc<dyn UiThread>,
}

impl SchedulerBuilder {
    /// Starts from the default configuration, the monotonic clock and an
    /// [`ImmediateUiThread`].
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            clock: Arc::new(MonotonicClock::new()),
            ui: Arc::new(ImmediateUiThread),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the time source the render loop measures frames with.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the toolkit-thread collaborator used for repaint hooks.
    pub fn ui_thread(mut self, ui: Arc<dyn UiThread>) -> Self {
        self.ui = ui;
        self
    }

    /// Validates the configuration and builds the scheduler.
    ///
    /// No thread is spawned until the scheduler is first used.
    pub fn build(self) -> SchedulerResult<Scheduler> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Scheduler {
        let shared = Shared {
            clock: self.clock,
            frame_rate: FrameRate::new(self.config.target_fps),
            targets: TargetRegistry::new(),
            handlers: HandlerRegistry::new(),
            latch: StartLatch::new(),
            worker_id: OnceLock::new(),
            stats: Mutex::new(FrameMetrics::new()),
            events: EventBus::with_capacity(self.config.event_capacity),
        };
        Scheduler {
            config: self.config,
            ui: self.ui,
            shared: Arc::new(shared),
            worker: Mutex::new(None),
        }
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives registered render targets from one dedicated thread at a fixed
/// frame rate.
///
/// The render thread is spawned lazily by the first call that needs it and
/// parks whenever no target is registered. Dropping a `Scheduler` stops and
/// joins its thread; the process-wide instance returned by
/// [`global`](crate::global) is never dropped.
pub struct Scheduler {
    config: SchedulerConfig,
    ui: Arc<dyn UiThread>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        SchedulerBuilder::new().assemble()
    }

    /// Creates a scheduler from `config`.
    pub fn with_config(config: SchedulerConfig) -> SchedulerResult<Self> {
        Self::builder().config(config).build()
    }

    /// Returns a builder for injecting a clock or toolkit thread.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Returns the configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // --- Lifecycle ---

    /// Spawns the render thread if needed and waits until it runs.
    ///
    /// Only the first caller spawns; concurrent and later callers wait for
    /// (or skip past) the same start signal.
    pub fn try_ensure_started(&self) -> SchedulerResult<()> {
        if self.shared.latch.is_released() {
            return Ok(());
        }
        {
            let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                let shared = Arc::clone(&self.shared);
                self.shared.latch.mark_starting();
                let spawned = thread::Builder::new()
                    .name(self.config.thread_name.clone())
                    .spawn(move || worker::run(shared));
                match spawned {
                    Ok(handle) => *slot = Some(handle),
                    Err(e) => {
                        self.shared.latch.abort_start();
                        return Err(SchedulerError::Spawn(e));
                    }
                }
            }
        }
        self.shared.latch.wait();
        Ok(())
    }

    /// Like [`try_ensure_started`](Self::try_ensure_started), but logs a
    /// spawn failure instead of returning it.
    ///
    /// Returns `true` if the render thread is running.
    pub fn ensure_started(&self) -> bool {
        match self.try_ensure_started() {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to start the render thread: {}", e);
                false
            }
        }
    }

    /// Returns `true` if the calling thread is the render thread.
    ///
    /// Starts the render thread first, so the answer is well-defined even
    /// before any target was added.
    pub fn is_on_scheduler_thread(&self) -> bool {
        self.ensure_started();
        self.shared.worker_id.get() == Some(&thread::current().id())
    }

    /// Returns how far the render thread's startup has progressed.
    pub fn start_phase(&self) -> StartPhase {
        self.shared.latch.phase()
    }

    /// Returns whether the render loop currently has work.
    pub fn state(&self) -> SchedulerState {
        self.shared.targets.state()
    }

    // --- Targets ---

    /// Registers `target` to be painted every frame.
    ///
    /// Returns `true` if the target was newly added. The target is asked to
    /// ignore the toolkit's own repaints (on the toolkit thread) and the
    /// render loop wakes if it was idle.
    pub fn try_add_target(&self, target: &Arc<dyn RenderTarget>) -> SchedulerResult<bool> {
        self.try_ensure_started()?;
        Ok(self.register(target))
    }

    /// Like [`try_add_target`](Self::try_add_target), logging a start failure.
    ///
    /// The target is registered even if the render thread could not be
    /// started; a later successful start will paint it.
    pub fn add_target(&self, target: &Arc<dyn RenderTarget>) -> bool {
        self.ensure_started();
        self.register(target)
    }

    fn register(&self, target: &Arc<dyn RenderTarget>) -> bool {
        let events = &self.shared.events;
        let change = self.shared.targets.add_then(target, |change| {
            if change == Change::Activated {
                events.publish(SchedulerEvent::Activated);
            }
        });
        if !change.is_changed() {
            log::trace!("Render target '{}' already registered.", target.label());
            return false;
        }
        log::debug!("Render target '{}' registered.", target.label());
        self.set_ignore_repaint(target, true);
        if change == Change::Activated {
            log::info!("Render loop active.");
        }
        true
    }

    /// Unregisters `target` and hands its repaints back to the toolkit.
    ///
    /// Returns `true` if it was registered. A frame already in flight may
    /// still paint it once.
    pub fn remove_target(&self, target: &Arc<dyn RenderTarget>) -> bool {
        let events = &self.shared.events;
        let change = self.shared.targets.remove_then(target, |change| {
            if change == Change::Idled {
                events.publish(SchedulerEvent::Idled);
            }
        });
        if !change.is_changed() {
            return false;
        }
        log::debug!("Render target '{}' unregistered.", target.label());
        self.set_ignore_repaint(target, false);
        if change == Change::Idled {
            log::info!("Render loop idle.");
        }
        true
    }

    /// Returns `true` if `target` is registered.
    pub fn contains_target(&self, target: &Arc<dyn RenderTarget>) -> bool {
        self.shared.targets.contains(target)
    }

    /// Returns the number of registered targets, including ones whose owner
    /// dropped them since the last frame.
    pub fn target_count(&self) -> usize {
        self.shared.targets.len()
    }

    fn set_ignore_repaint(&self, target: &Arc<dyn RenderTarget>, ignore: bool) {
        let target = Arc::clone(target);
        self.ui
            .run_or_dispatch(Box::new(move || target.set_ignore_repaint(ignore)));
    }

    // --- Frame handlers ---

    /// Registers `handler` to run at the start of every frame.
    ///
    /// Returns `true` if it was newly added. The scheduler keeps only a weak
    /// reference; dropping the last `Arc` unregisters the handler.
    pub fn add_frame_handler(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        let added = self.shared.handlers.add(handler);
        if added {
            log::debug!("Frame handler registered.");
        }
        added
    }

    /// Returns `true` if `handler` is registered. Linear in the number of
    /// handlers.
    pub fn contains_frame_handler(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        self.shared.handlers.contains(handler)
    }

    /// Unregisters `handler`. Returns `true` if it was registered.
    pub fn remove_frame_handler(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        let removed = self.shared.handlers.remove(handler);
        if removed {
            log::debug!("Frame handler unregistered.");
        }
        removed
    }

    // --- Tuning & observation ---

    /// Returns a live handle on the target frame rate.
    pub fn frame_rate(&self) -> FrameRate {
        self.shared.frame_rate.clone()
    }

    /// Returns the target frame rate in frames per second.
    pub fn target_fps(&self) -> u32 {
        self.shared.frame_rate.get()
    }

    /// Changes the target frame rate. Takes effect on the next frame.
    pub fn set_target_fps(&self, fps: u32) {
        log::debug!("Target frame rate set to {} fps.", fps);
        self.shared.frame_rate.set(fps);
    }

    /// Returns statistics about the frames run so far.
    pub fn frame_stats(&self) -> FrameStats {
        self.shared
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Returns a receiver for lifecycle events.
    ///
    /// Receivers share one queue: each event is delivered to one of them.
    pub fn events(&self) -> flume::Receiver<SchedulerEvent> {
        self.shared.events.subscribe()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("phase", &self.start_phase())
            .field("state", &self.state())
            .field("target_fps", &self.target_fps())
            .field("targets", &self.shared.targets.len())
            .field("handlers", &self.shared.handlers.len())
            .finish()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shared.targets.gate().shut_down();
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                log::warn!("Scheduler dropped on its own render thread; not joining.");
            } else if handle.join().is_err() {
                log::error!("Render thread panicked during shutdown.");
            }
        }
    }
}
