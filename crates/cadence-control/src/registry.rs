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

//! Copy-on-write registries for render targets and frame handlers.
//!
//! Every mutation builds a fresh vector and publishes it atomically. The
//! render loop loads the current vector once per frame and iterates that
//! snapshot, so callers adding or removing entries never wait on a frame in
//! progress and the loop never sees a half-updated list.

use crate::lifecycle::{ActivityGate, GateGuard, Resume, SchedulerState};
use arc_swap::ArcSwap;
use cadence_core::{FrameHandler, HandlerId, RenderTarget, TargetId};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// An immutable list published by a [`SnapshotList`].
pub type Snapshot<T> = Arc<Vec<T>>;

/// A list with lock-free reads and serialized copy-on-write updates.
#[derive(Debug)]
pub struct SnapshotList<T> {
    current: ArcSwap<Vec<T>>,
    writer: Mutex<()>,
}

impl<T: Clone> SnapshotList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Returns the current contents. Later updates never alter it.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.current.load_full()
    }

    /// Applies `edit` to a copy of the current contents and publishes the
    /// result if `edit` returns `true`.
    ///
    /// Updates are serialized, so none is lost or applied twice.
    pub fn update(&self, edit: impl FnOnce(&mut Vec<T>) -> bool) -> bool {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&self.current.load());
        if edit(&mut next) {
            self.current.store(Arc::new(next));
            true
        } else {
            false
        }
    }

    /// Returns the number of entries in the current contents.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns `true` if the current contents are empty.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl<T: Clone> Default for SnapshotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of a registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing changed (duplicate add, unknown remove).
    Unchanged,
    /// The contents changed; the scheduler state did not.
    Updated,
    /// The first target arrived: Idle→Active.
    Activated,
    /// The last target left: Active→Idle.
    Idled,
}

impl Change {
    /// Returns `true` if the registry contents changed.
    pub fn is_changed(self) -> bool {
        self != Change::Unchanged
    }
}

/// A registered target: its identity plus a non-owning handle.
#[derive(Clone)]
pub struct TargetEntry {
    id: TargetId,
    target: Weak<dyn RenderTarget>,
}

impl TargetEntry {
    fn new(target: &Arc<dyn RenderTarget>) -> Self {
        Self {
            id: TargetId::of(target),
            target: Arc::downgrade(target),
        }
    }

    /// Returns the target's identity.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Returns the target if its owner still holds it.
    pub fn upgrade(&self) -> Option<Arc<dyn RenderTarget>> {
        self.target.upgrade()
    }
}

impl std::fmt::Debug for TargetEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetEntry")
            .field("id", &self.id)
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// The set of targets painted every frame, plus the idle/active gate.
///
/// Each mutation runs inside the gate's critical section, which is what
/// keeps "Active iff non-empty" true at every instant. The gate itself is
/// not reachable from outside the crate, so only mutations can move it:
///
/// ```compile_fail
/// use cadence_control::registry::TargetRegistry;
///
/// let registry = TargetRegistry::new();
/// registry.gate().lock().wake();
/// ```
#[derive(Debug)]
pub struct TargetRegistry {
    entries: SnapshotList<TargetEntry>,
    gate: ActivityGate,
}

impl TargetRegistry {
    /// Creates an empty, idle registry.
    pub fn new() -> Self {
        Self {
            entries: SnapshotList::new(),
            gate: ActivityGate::new(),
        }
    }

    /// Adds `target` unless it is already registered.
    pub fn add(&self, target: &Arc<dyn RenderTarget>) -> Change {
        self.add_then(target, |_| {})
    }

    /// Adds `target` and, if the contents changed, runs `on_change` before
    /// the gate is released.
    ///
    /// Whatever `on_change` records about an Idle/Active transition is
    /// ordered exactly like the transitions themselves. It must not call
    /// back into the registry.
    pub fn add_then(&self, target: &Arc<dyn RenderTarget>, on_change: impl FnOnce(Change)) -> Change {
        let mut gate = self.gate.lock();
        let id = TargetId::of(target);
        // Entries hold a weak handle, so a live id can't alias a dead entry.
        let inserted = self.entries.update(|entries| {
            if entries.iter().any(|entry| entry.id == id) {
                return false;
            }
            entries.push(TargetEntry::new(target));
            true
        });
        if !inserted {
            return Change::Unchanged;
        }
        let change = if gate.wake() {
            Change::Activated
        } else {
            Change::Updated
        };
        on_change(change);
        change
    }

    /// Removes `target` if it is registered.
    pub fn remove(&self, target: &Arc<dyn RenderTarget>) -> Change {
        self.remove_ids_then(&[TargetId::of(target)], |_| {})
    }

    /// Removes `target` and, if it was registered, runs `on_change` before
    /// the gate is released.
    pub fn remove_then(&self, target: &Arc<dyn RenderTarget>, on_change: impl FnOnce(Change)) -> Change {
        self.remove_ids_then(&[TargetId::of(target)], on_change)
    }

    /// Removes every entry whose identity is in `ids`.
    pub fn remove_ids(&self, ids: &[TargetId]) -> Change {
        self.remove_ids_then(ids, |_| {})
    }

    /// Removes every entry whose identity is in `ids`, running `on_change`
    /// inside the gate's critical section if anything was removed.
    pub fn remove_ids_then(&self, ids: &[TargetId], on_change: impl FnOnce(Change)) -> Change {
        let mut gate = self.gate.lock();
        let removed = self.entries.update(|entries| {
            let before = entries.len();
            entries.retain(|entry| !ids.contains(&entry.id));
            entries.len() != before
        });
        if !removed {
            return Change::Unchanged;
        }
        let change = self.settle(&mut gate);
        on_change(change);
        change
    }

    fn settle(&self, gate: &mut GateGuard<'_>) -> Change {
        if self.entries.is_empty() && gate.maybe_idle() {
            Change::Idled
        } else {
            Change::Updated
        }
    }

    /// Returns `true` if `target` is registered.
    pub fn contains(&self, target: &Arc<dyn RenderTarget>) -> bool {
        let id = TargetId::of(target);
        self.entries.snapshot().iter().any(|entry| entry.id == id)
    }

    /// Returns the targets to paint this frame.
    pub fn snapshot(&self) -> Snapshot<TargetEntry> {
        self.entries.snapshot()
    }

    /// Returns the number of registered targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no target is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the scheduler state implied by the registry.
    pub fn state(&self) -> SchedulerState {
        self.gate.state()
    }

    /// Parks the caller until a target is registered.
    pub fn wait_active(&self) -> Resume {
        self.gate.wait_active()
    }

    /// Returns the gate the render loop paces and parks on.
    pub(crate) fn gate(&self) -> &ActivityGate {
        &self.gate
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered frame handler: its identity plus a non-owning handle.
#[derive(Clone)]
pub struct HandlerEntry {
    id: HandlerId,
    handler: Weak<dyn FrameHandler>,
}

impl HandlerEntry {
    /// Returns the handler's identity.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Returns the handler if its owner still holds it.
    pub fn upgrade(&self) -> Option<Arc<dyn FrameHandler>> {
        self.handler.upgrade()
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("alive", &(self.handler.strong_count() > 0))
            .finish()
    }
}

/// The callbacks run at the start of every frame.
///
/// Lookups are linear scans. Handlers are few and registered rarely, so a
/// flat list beats any indexed structure here.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: SnapshotList<HandlerEntry>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` unless it is already registered.
    ///
    /// Entries whose owner dropped the handler are pruned on the way.
    pub fn add(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        let id = HandlerId::of(handler);
        let mut inserted = false;
        self.entries.update(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.handler.strong_count() > 0);
            if !entries.iter().any(|entry| entry.id == id) {
                entries.push(HandlerEntry {
                    id,
                    handler: Arc::downgrade(handler),
                });
                inserted = true;
            }
            inserted || entries.len() != before
        });
        inserted
    }

    /// Removes `handler`. Returns `true` if it was registered.
    pub fn remove(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        let id = HandlerId::of(handler);
        let mut removed = false;
        self.entries.update(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed = entries.len() != before;
            entries.retain(|entry| entry.handler.strong_count() > 0);
            entries.len() != before
        });
        removed
    }

    /// Returns `true` if `handler` is registered.
    pub fn contains(&self, handler: &Arc<dyn FrameHandler>) -> bool {
        let id = HandlerId::of(handler);
        self.entries.snapshot().iter().any(|entry| entry.id == id)
    }

    /// Returns the handlers to run this frame.
    pub fn snapshot(&self) -> Snapshot<HandlerEntry> {
        self.entries.snapshot()
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::PaintError;
    use std::thread;

    struct Surface;

    impl RenderTarget for Surface {
        fn paint(&self) -> Result<(), PaintError> {
            Ok(())
        }
        fn is_displayable(&self) -> bool {
            true
        }
    }

    fn surface() -> Arc<dyn RenderTarget> {
        Arc::new(Surface)
    }

    #[test]
    fn test_snapshot_is_stable_across_updates() {
        let list = SnapshotList::<u32>::new();
        list.update(|v| {
            v.push(1);
            true
        });
        let before = list.snapshot();

        list.update(|v| {
            v.push(2);
            true
        });
        assert_eq!(*before, vec![1]);
        assert_eq!(*list.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_edit_publishes_nothing() {
        let list = SnapshotList::<u32>::new();
        let before = list.snapshot();
        assert!(!list.update(|v| {
            v.push(9);
            false
        }));
        assert!(Arc::ptr_eq(&before, &list.snapshot()));
    }

    #[test]
    fn test_first_add_activates_and_last_remove_idles() {
        let registry = TargetRegistry::new();
        let a = surface();
        let b = surface();
        assert_eq!(registry.state(), SchedulerState::Idle);

        assert_eq!(registry.add(&a), Change::Activated);
        assert_eq!(registry.add(&b), Change::Updated);
        assert_eq!(registry.state(), SchedulerState::Active);

        assert_eq!(registry.remove(&a), Change::Updated);
        assert_eq!(registry.remove(&b), Change::Idled);
        assert_eq!(registry.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_duplicate_add_is_a_no_op() {
        let registry = TargetRegistry::new();
        let a = surface();
        assert_eq!(registry.add(&a), Change::Activated);
        assert_eq!(registry.add(&a.clone()), Change::Unchanged);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_removing_an_unknown_target_changes_nothing() {
        let registry = TargetRegistry::new();
        let a = surface();
        registry.add(&a);
        assert_eq!(registry.remove(&surface()), Change::Unchanged);
        assert_eq!(registry.state(), SchedulerState::Active);
    }

    #[test]
    fn test_registry_does_not_own_targets() {
        let registry = TargetRegistry::new();
        let a = surface();
        registry.add(&a);
        let weak = Arc::downgrade(&a);
        drop(a);

        assert!(weak.upgrade().is_none());
        let snapshot = registry.snapshot();
        assert!(snapshot[0].upgrade().is_none());

        let ids: Vec<_> = snapshot.iter().map(TargetEntry::id).collect();
        assert_eq!(registry.remove_ids(&ids), Change::Idled);
    }

    #[test]
    fn test_concurrent_adds_and_removes_are_not_lost() {
        let registry = Arc::new(TargetRegistry::new());
        let keep: Vec<_> = (0..8).map(|_| surface()).collect();

        let workers: Vec<_> = keep
            .iter()
            .cloned()
            .map(|target| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        registry.add(&target);
                        registry.remove(&target);
                    }
                    registry.add(&target);
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("Registry worker panicked");
        }

        assert_eq!(registry.len(), keep.len());
        assert_eq!(registry.state(), SchedulerState::Active);
    }

    #[test]
    fn test_change_callbacks_run_in_transition_order() {
        let registry = Arc::new(TargetRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let seen = seen.clone();
                thread::spawn(move || {
                    let target = surface();
                    for _ in 0..200 {
                        registry.add_then(&target, |change| seen.lock().unwrap().push(change));
                        registry.remove_then(&target, |change| seen.lock().unwrap().push(change));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("Registry worker panicked");
        }

        let seen = seen.lock().unwrap();
        let transitions: Vec<_> = seen
            .iter()
            .copied()
            .filter(|change| matches!(change, Change::Activated | Change::Idled))
            .collect();
        for pair in transitions.windows(2) {
            assert_ne!(pair[0], pair[1], "transitions must alternate");
        }
        assert_eq!(transitions.first(), Some(&Change::Activated));
        assert_eq!(transitions.last(), Some(&Change::Idled));
        assert_eq!(registry.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_handler_add_contains_remove() {
        let registry = HandlerRegistry::new();
        let h: Arc<dyn FrameHandler> = Arc::new(|_: u64| {});

        assert!(!registry.contains(&h));
        assert!(registry.add(&h));
        assert!(!registry.add(&h));
        assert!(registry.contains(&h));
        assert!(registry.remove(&h));
        assert!(!registry.contains(&h));
        assert!(!registry.remove(&h));
    }

    #[test]
    fn test_dropped_handlers_are_pruned_on_mutation() {
        let registry = HandlerRegistry::new();
        let dropped: Arc<dyn FrameHandler> = Arc::new(|_: u64| {});
        let kept: Arc<dyn FrameHandler> = Arc::new(|_: u64| {});
        registry.add(&dropped);
        drop(dropped);

        registry.add(&kept);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&kept));
    }
}
