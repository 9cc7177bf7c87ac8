//! Process-wide specialization cache.
//!
//! # Design
//!
//! One outer mutex guards a map from signature to a per-signature cell
//! (lock striping). The outer lock is held only to look up or install a
//! cell, never across body resolution, so unrelated signatures resolve in
//! parallel while attempts at the same signature serialize on its cell.
//!
//! The thread that installs a cell holds its lock until it commits the
//! definition. Other threads block on the cell and wake up to a complete
//! definition. If the owner gives up (failure or a provisional result) it
//! removes the cell before unlocking, and waiters retry from scratch.
//!
//! Waiting is recorded in a wait-for map. A thread that would wait on a
//! cell whose owner (transitively) waits on this thread resolves the
//! signature independently instead, and publishes only if no other
//! definition was committed meanwhile.

use std::sync::{Arc, LazyLock};
use std::thread::{self, ThreadId};

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rustc_hash::FxHashMap;

use crate::binary::BinaryType;
use crate::FunctionDefinition;

type Cell = Arc<Mutex<Option<Arc<FunctionDefinition>>>>;

static CACHE: LazyLock<DefinitionCache> = LazyLock::new(DefinitionCache::default);

#[derive(Clone)]
struct Entry {
    owner: ThreadId,
    cell: Cell,
}

#[derive(Default)]
struct CacheState {
    entries: FxHashMap<BinaryType, Entry>,
    /// Signature each blocked thread is waiting on.
    waiting: FxHashMap<ThreadId, BinaryType>,
}

impl CacheState {
    /// Whether `me` waiting on a cell owned by `owner` would close a cycle.
    fn closes_cycle(&self, owner: ThreadId, me: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == me {
                return true;
            }
            let Some(entry) = self
                .waiting
                .get(&current)
                .and_then(|signature| self.entries.get(signature))
            else {
                return false;
            };
            current = entry.owner;
        }
        false
    }
}

#[derive(Default)]
pub(crate) struct DefinitionCache {
    state: Mutex<CacheState>,
}

/// Outcome of [`DefinitionCache::claim`].
pub(crate) enum Claim {
    /// A committed definition.
    Ready(Arc<FunctionDefinition>),
    /// This thread owns the signature and must commit or abandon it.
    Owned(OwnedSlot),
    /// Waiting would deadlock; resolve without owning.
    Contended,
}

impl DefinitionCache {
    pub(crate) fn global() -> &'static DefinitionCache {
        &CACHE
    }

    pub(crate) fn claim(&'static self, signature: &BinaryType) -> Claim {
        let me = thread::current().id();
        loop {
            let mut state = self.state.lock();
            let Some(entry) = state.entries.get(signature).cloned() else {
                let cell: Cell = Arc::new(Mutex::new(None));
                let guard = cell.lock_arc();
                state.entries.insert(
                    signature.clone(),
                    Entry {
                        owner: me,
                        cell: Arc::clone(&cell),
                    },
                );
                return Claim::Owned(OwnedSlot {
                    cache: self,
                    signature: signature.clone(),
                    cell,
                    guard: Some(guard),
                });
            };

            if let Some(guard) = entry.cell.try_lock() {
                if let Some(definition) = guard.as_ref() {
                    return Claim::Ready(Arc::clone(definition));
                }
                // unlocked and empty: left behind by an owner that unwound
                drop(guard);
                state.entries.remove(signature);
                continue;
            }

            if state.closes_cycle(entry.owner, me) {
                return Claim::Contended;
            }
            state.waiting.insert(me, signature.clone());
            drop(state);

            tracing::trace!(?signature, "waiting for another thread");
            let committed = entry.cell.lock().clone();
            self.state.lock().waiting.remove(&me);
            if let Some(definition) = committed {
                return Claim::Ready(definition);
            }
        }
    }

    /// Publish a definition resolved without owning its signature. Returns
    /// the definition every caller should use.
    pub(crate) fn publish_independent(
        &self,
        signature: &BinaryType,
        definition: Arc<FunctionDefinition>,
    ) -> Arc<FunctionDefinition> {
        let mut state = self.state.lock();
        if let Some(entry) = state.entries.get(signature).cloned() {
            let existing = entry.cell.try_lock().and_then(|guard| guard.clone());
            return existing.unwrap_or(definition);
        }
        state.entries.insert(
            signature.clone(),
            Entry {
                owner: thread::current().id(),
                cell: Arc::new(Mutex::new(Some(Arc::clone(&definition)))),
            },
        );
        definition
    }

    /// Whether a committed definition exists for `signature`.
    #[cfg(test)]
    pub(crate) fn is_committed(&self, signature: &BinaryType) -> bool {
        let state = self.state.lock();
        state
            .entries
            .get(signature)
            .and_then(|entry| entry.cell.try_lock().map(|guard| guard.is_some()))
            .unwrap_or(false)
    }

    fn abandon(&self, signature: &BinaryType, cell: &Cell) {
        let mut state = self.state.lock();
        if state
            .entries
            .get(signature)
            .is_some_and(|entry| Arc::ptr_eq(&entry.cell, cell))
        {
            state.entries.remove(signature);
        }
    }
}

/// Ownership of an in-flight signature. Dropping without committing
/// removes the cell and wakes waiters.
pub(crate) struct OwnedSlot {
    cache: &'static DefinitionCache,
    signature: BinaryType,
    cell: Cell,
    guard: Option<ArcMutexGuard<RawMutex, Option<Arc<FunctionDefinition>>>>,
}

impl OwnedSlot {
    pub(crate) fn commit(mut self, definition: Arc<FunctionDefinition>) -> Arc<FunctionDefinition> {
        if let Some(mut guard) = self.guard.take() {
            *guard = Some(Arc::clone(&definition));
        }
        definition
    }
}

impl Drop for OwnedSlot {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            self.cache.abandon(&self.signature, &self.cell);
            drop(guard);
        }
    }
}
