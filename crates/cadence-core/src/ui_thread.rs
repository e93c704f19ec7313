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

//! Access to the host toolkit's single event-dispatch thread.
//!
//! Some toolkit state (such as whether a widget ignores its own repaint
//! events) may only be touched from the toolkit's event thread. The
//! scheduler never owns that thread; it routes such work through a
//! [`UiThread`] supplied by the host.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// A unit of work to run on the toolkit thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// The host toolkit's event-dispatch thread, as seen by the scheduler.
pub trait UiThread: Send + Sync {
    /// Returns `true` if the calling thread is the toolkit thread.
    fn is_current(&self) -> bool;

    /// Queues `task` to run on the toolkit thread.
    fn dispatch(&self, task: UiTask);

    /// Runs `task` inline when already on the toolkit thread, otherwise
    /// queues it.
    fn run_or_dispatch(&self, task: UiTask) {
        if self.is_current() {
            task();
        } else {
            self.dispatch(task);
        }
    }
}

/// A [`UiThread`] for hosts without thread confinement.
///
/// Every thread counts as the toolkit thread; tasks run inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateUiThread;

impl UiThread for ImmediateUiThread {
    fn is_current(&self) -> bool {
        true
    }

    fn dispatch(&self, task: UiTask) {
        task();
    }
}

/// A [`UiThread`] that forwards tasks over a channel to the thread that
/// created it.
///
/// The owning thread drains the queue through the paired [`TaskPump`],
/// typically once per turn of its own event loop.
#[derive(Debug, Clone)]
pub struct ChannelUiThread {
    owner: ThreadId,
    sender: Sender<UiTask>,
}

impl ChannelUiThread {
    /// Binds a new task queue to the calling thread.
    pub fn for_current_thread() -> (Self, TaskPump) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let owner = thread::current().id();
        log::debug!("ChannelUiThread bound to {:?}", owner);
        (Self { owner, sender }, TaskPump { owner, receiver })
    }
}

impl UiThread for ChannelUiThread {
    fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn dispatch(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            log::warn!("ChannelUiThread: task pump dropped, discarding UI task.");
        }
    }
}

/// The receiving half of a [`ChannelUiThread`], drained on the toolkit thread.
#[derive(Debug)]
pub struct TaskPump {
    owner: ThreadId,
    receiver: Receiver<UiTask>,
}

impl TaskPump {
    /// Runs every task queued so far and returns how many ran.
    pub fn run_pending(&self) -> usize {
        self.assert_owner();
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Runs tasks as they arrive until `timeout` has elapsed.
    ///
    /// Returns how many tasks ran. Stops early if every sender is gone.
    pub fn run_for(&self, timeout: Duration) -> usize {
        self.assert_owner();
        let deadline = Instant::now() + timeout;
        let mut ran = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ran
    }

    #[inline]
    fn assert_owner(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "TaskPump must be drained on the thread that created it"
        );
    }
}
