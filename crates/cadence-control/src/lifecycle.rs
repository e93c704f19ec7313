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

//! Synchronization between caller threads and the render thread.
//!
//! Two primitives live here:
//! - [`StartLatch`], the one-shot "render thread is running" handshake;
//! - [`ActivityGate`], the idle/active switch the render loop parks on.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Whether the render loop has work.
///
/// `Active` holds exactly while at least one target is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// No targets; the render thread is parked.
    Idle,
    /// Targets present; the render thread is iterating.
    Active,
}

/// Progress of the render thread's one-time startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartPhase {
    /// No render thread has been requested yet.
    Uninitialized,
    /// The thread was spawned but has not entered its run body.
    Starting,
    /// The thread is running. Latched: never goes back.
    Started,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A one-shot latch released by the render thread once it is live.
///
/// Callers that arrive after the release return from [`wait`](Self::wait)
/// immediately.
#[derive(Debug)]
pub struct StartLatch {
    phase: Mutex<StartPhase>,
    released: Condvar,
}

impl StartLatch {
    /// Creates an unreleased latch.
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(StartPhase::Uninitialized),
            released: Condvar::new(),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> StartPhase {
        *lock(&self.phase)
    }

    /// Returns `true` once the latch has been released.
    pub fn is_released(&self) -> bool {
        self.phase() == StartPhase::Started
    }

    /// Records that a thread has been spawned and will release the latch.
    pub fn mark_starting(&self) {
        let mut phase = lock(&self.phase);
        if *phase == StartPhase::Uninitialized {
            *phase = StartPhase::Starting;
        }
    }

    /// Returns to `Uninitialized` after a failed spawn. No-op once released.
    pub fn abort_start(&self) {
        let mut phase = lock(&self.phase);
        if *phase == StartPhase::Starting {
            *phase = StartPhase::Uninitialized;
        }
    }

    /// Releases every current and future waiter.
    pub fn release(&self) {
        *lock(&self.phase) = StartPhase::Started;
        self.released.notify_all();
    }

    /// Blocks until the latch is released.
    pub fn wait(&self) {
        let phase = lock(&self.phase);
        let _released = self
            .released
            .wait_while(phase, |phase| *phase != StartPhase::Started)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

impl Default for StartLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// How the render loop got past [`ActivityGate::wait_active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// The gate was already open; the loop keeps running.
    Running,
    /// The loop was parked and has just been woken by a new target.
    Resumed,
    /// The scheduler is being torn down; the loop must exit.
    Shutdown,
}

#[derive(Debug)]
struct GateState {
    state: SchedulerState,
    shutdown: bool,
}

/// The idle/active switch of the render loop.
///
/// Registry mutations hold the gate's lock while they publish a new target
/// list, so the state always agrees with the registry contents and a wake
/// can never slip between the loop's emptiness check and its wait.
#[derive(Debug)]
pub struct ActivityGate {
    inner: Mutex<GateState>,
    changed: Condvar,
}

impl ActivityGate {
    /// Creates an idle gate.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GateState {
                state: SchedulerState::Idle,
                shutdown: false,
            }),
            changed: Condvar::new(),
        }
    }

    /// Locks the gate for a state transition.
    pub(crate) fn lock(&self) -> GateGuard<'_> {
        GateGuard {
            guard: lock(&self.inner),
            changed: &self.changed,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SchedulerState {
        lock(&self.inner).state
    }

    /// Parks the caller while the gate is idle.
    pub fn wait_active(&self) -> Resume {
        let mut guard = lock(&self.inner);
        if guard.shutdown {
            return Resume::Shutdown;
        }
        if guard.state == SchedulerState::Active {
            return Resume::Running;
        }
        log::debug!("ActivityGate: render loop parked.");
        while guard.state == SchedulerState::Idle && !guard.shutdown {
            guard = self
                .changed
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if guard.shutdown {
            Resume::Shutdown
        } else {
            Resume::Resumed
        }
    }

    /// Sleeps for up to `duration`. Returns early only on shutdown.
    pub fn pause(&self, duration: Duration) {
        let guard = lock(&self.inner);
        let _ = self
            .changed
            .wait_timeout_while(guard, duration, |state| !state.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Flags the gate for shutdown and wakes every waiter.
    pub fn shut_down(&self) {
        lock(&self.inner).shutdown = true;
        self.changed.notify_all();
    }

    /// Returns `true` once [`shut_down`](Self::shut_down) was called.
    pub fn is_shut_down(&self) -> bool {
        lock(&self.inner).shutdown
    }
}

impl Default for ActivityGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to the gate during a registry mutation.
#[derive(Debug)]
pub(crate) struct GateGuard<'a> {
    guard: MutexGuard<'a, GateState>,
    changed: &'a Condvar,
}

impl GateGuard<'_> {
    /// Idle→Active: opens the gate and wakes the parked loop.
    ///
    /// Returns `true` if this call performed the transition.
    pub(crate) fn wake(&mut self) -> bool {
        if self.guard.state == SchedulerState::Active {
            return false;
        }
        self.guard.state = SchedulerState::Active;
        self.changed.notify_all();
        true
    }

    /// Active→Idle: closes the gate.
    ///
    /// The loop is not interrupted; it finishes its current frame and parks
    /// the next time it checks the gate. Returns `true` if this call
    /// performed the transition.
    pub(crate) fn maybe_idle(&mut self) -> bool {
        if self.guard.state == SchedulerState::Idle {
            return false;
        }
        self.guard.state = SchedulerState::Idle;
        true
    }
}
