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

//! Per-frame callbacks run before targets are painted.

use std::sync::{Arc, Weak};

/// A callback invoked once per frame, before any target is painted.
///
/// Closures taking the elapsed nanoseconds implement this trait:
///
/// ```rust
/// use cadence_core::FrameHandler;
/// use std::sync::Arc;
///
/// let handler: Arc<dyn FrameHandler> = Arc::new(|elapsed_ns: u64| {
///     let _ = elapsed_ns;
/// });
/// handler.on_frame(16_000_000);
/// ```
pub trait FrameHandler: Send + Sync {
    /// Called with the nanoseconds elapsed since the previous frame started.
    fn on_frame(&self, elapsed_ns: u64);
}

impl<F> FrameHandler for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_frame(&self, elapsed_ns: u64) {
        self(elapsed_ns)
    }
}

/// Identity of a registered [`FrameHandler`].
///
/// Handlers are compared by the allocation that backs the `Arc` the caller
/// registered, never by the behavior of the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Returns the identity of a strong handler handle.
    pub fn of(handler: &Arc<dyn FrameHandler>) -> Self {
        Self(Arc::as_ptr(handler) as *const () as usize)
    }

    /// Returns the identity of a weak handler handle.
    pub fn of_weak(handler: &Weak<dyn FrameHandler>) -> Self {
        Self(Weak::as_ptr(handler) as *const () as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_closures_are_frame_handlers() {
        let total = Arc::new(AtomicU64::new(0));
        let sink = total.clone();
        let handler: Arc<dyn FrameHandler> = Arc::new(move |ns: u64| {
            sink.fetch_add(ns, Ordering::Relaxed);
        });

        handler.on_frame(10);
        handler.on_frame(32);
        assert_eq!(total.load(Ordering::Relaxed), 42);
    }

    #[test]
    fn test_identical_closures_have_distinct_identities() {
        let a: Arc<dyn FrameHandler> = Arc::new(|_: u64| {});
        let b: Arc<dyn FrameHandler> = Arc::new(|_: u64| {});
        let a_again = a.clone();

        assert_eq!(HandlerId::of(&a), HandlerId::of(&a_again));
        assert_ne!(HandlerId::of(&a), HandlerId::of(&b));
        assert_eq!(HandlerId::of(&a), HandlerId::of_weak(&Arc::downgrade(&a)));
    }
}
