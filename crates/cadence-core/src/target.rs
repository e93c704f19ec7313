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

//! The paintable surface contract consumed by the scheduler.

use crate::error::PaintError;
use std::sync::{Arc, Weak};

/// A surface that the active render loop paints every frame.
///
/// Any toolkit widget, canvas, or off-screen surface can implement this
/// trait to be driven by the scheduler instead of the toolkit's reactive
/// repaint cycle.
///
/// The scheduler only keeps a [`Weak`] reference to a registered target.
/// Whoever owns the surface keeps it alive; removing a target from the
/// scheduler never destroys it.
pub trait RenderTarget: Send + Sync {
    /// Draws the current frame.
    ///
    /// Called on the scheduler thread. An error (or a panic) only affects
    /// this target for this frame; it is retried on the next one.
    fn paint(&self) -> Result<(), PaintError>;

    /// Returns `true` while the underlying surface is realized and paintable.
    ///
    /// Queried before every paint attempt. A `false` result skips the target
    /// for the current frame without unregistering it.
    fn is_displayable(&self) -> bool;

    /// Opts the target in or out of the toolkit's own repaint handling.
    ///
    /// Invoked on the toolkit thread with `true` when the target is handed to
    /// the scheduler and with `false` when it is handed back.
    fn set_ignore_repaint(&self, _ignore: bool) {}

    /// A human readable name used in log output.
    fn label(&self) -> &str {
        "render-target"
    }
}

/// Identity of a registered [`RenderTarget`].
///
/// Two handles refer to the same target iff they point at the same shared
/// allocation, regardless of which trait object or concrete type was used
/// to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

impl TargetId {
    /// Returns the identity of a strong target handle.
    pub fn of(target: &Arc<dyn RenderTarget>) -> Self {
        Self(Arc::as_ptr(target) as *const () as usize)
    }

    /// Returns the identity of a weak target handle.
    ///
    /// The allocation stays reserved while any weak handle exists, so the
    /// identity cannot be reused by another target in the meantime.
    pub fn of_weak(target: &Weak<dyn RenderTarget>) -> Self {
        Self(Weak::as_ptr(target) as *const () as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canvas;

    impl RenderTarget for Canvas {
        fn paint(&self) -> Result<(), PaintError> {
            Ok(())
        }
        fn is_displayable(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_identity_follows_the_allocation() {
        let concrete = Arc::new(Canvas);
        let a: Arc<dyn RenderTarget> = concrete.clone();
        let b: Arc<dyn RenderTarget> = concrete;
        let other: Arc<dyn RenderTarget> = Arc::new(Canvas);

        assert_eq!(TargetId::of(&a), TargetId::of(&b));
        assert_ne!(TargetId::of(&a), TargetId::of(&other));
    }

    #[test]
    fn test_weak_and_strong_identities_match() {
        let a: Arc<dyn RenderTarget> = Arc::new(Canvas);
        let weak = Arc::downgrade(&a);
        assert_eq!(TargetId::of(&a), TargetId::of_weak(&weak));

        drop(a);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_default_hooks_are_inert() {
        let canvas = Canvas;
        canvas.set_ignore_repaint(true);
        assert_eq!(canvas.label(), "render-target");
    }
}
