//! Specializations in progress on the current thread.
//!
//! Each `resolve_call` that starts resolving a body pushes a frame keyed by
//! its signature. A later call with the same signature on this thread is a
//! recursive re-entry and gets an open definition instead of recursing.
//!
//! Frames also record how their body depended on open results:
//! - `open_dependency`: the lowest frame below this one whose open result
//!   the body consumed, directly or through a provisional callee;
//! - `consumed_provisional`: the body used a callee result that was not
//!   final.
//!
//! The thread-local state needs no locking; it lives exactly as long as the
//! frames of this thread's resolution.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tarn_ir::Info;

use crate::binary::BinaryType;
use crate::MetaType;

struct Frame {
    signature: BinaryType,
    info: Info,
    /// Result assumed for re-entries on a second pass.
    seeded: Option<MetaType>,
    open_dependency: Option<usize>,
    consumed_provisional: bool,
}

#[derive(Default)]
struct ResolvingStack {
    frames: SmallVec<[Frame; 16]>,
    index: FxHashMap<BinaryType, usize>,
}

impl ResolvingStack {
    fn note_dependency(&mut self, dependency: usize) {
        let depth = self.frames.len();
        if let Some(top) = self.frames.last_mut() {
            if dependency + 1 < depth {
                top.open_dependency =
                    Some(top.open_dependency.map_or(dependency, |d| d.min(dependency)));
            }
        }
    }
}

thread_local! {
    static RESOLVING: RefCell<ResolvingStack> = RefCell::new(ResolvingStack::default());
}

/// How the frame's body depended on results that were not final.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub(crate) struct FrameFlags {
    pub open_dependency: Option<usize>,
    pub consumed_provisional: bool,
}

/// If `signature` is in flight on this thread, the result to assume for the
/// re-entry: the seeded result on a second pass, otherwise a placeholder.
/// An unseeded hit below the current frame is recorded as a dependency.
pub(crate) fn reenter(signature: &BinaryType) -> Option<MetaType> {
    RESOLVING.with_borrow_mut(|stack| {
        let index = *stack.index.get(signature)?;
        let seeded = stack.frames.get(index)?.seeded.clone();
        match seeded {
            Some(result) => Some(result),
            None => {
                stack.note_dependency(index);
                Some(MetaType::PlaceHolder)
            }
        }
    })
}

/// Record on the current frame that a callee returned a provisional result
/// depending on frame `dependency`.
pub(crate) fn consume_provisional(dependency: usize) {
    RESOLVING.with_borrow_mut(|stack| {
        stack.note_dependency(dependency);
        if let Some(top) = stack.frames.last_mut() {
            top.consumed_provisional = true;
        }
    });
}

/// Push a frame for `signature`. The frame is popped when the guard drops.
pub(crate) fn push(signature: BinaryType, info: Info, seeded: Option<MetaType>) -> FrameGuard {
    RESOLVING.with_borrow_mut(|stack| {
        let depth = stack.frames.len();
        stack.index.insert(signature.clone(), depth);
        stack.frames.push(Frame {
            signature,
            info,
            seeded,
            open_dependency: None,
            consumed_provisional: false,
        });
        FrameGuard { depth }
    })
}

/// Number of frames on this thread.
pub(crate) fn depth() -> usize {
    RESOLVING.with_borrow(|stack| stack.frames.len())
}

/// A pushed frame.
pub(crate) struct FrameGuard {
    depth: usize,
}

impl FrameGuard {
    pub(crate) fn flags(&self) -> FrameFlags {
        RESOLVING.with_borrow(|stack| {
            stack
                .frames
                .get(self.depth)
                .map(|frame| FrameFlags {
                    open_dependency: frame.open_dependency,
                    consumed_provisional: frame.consumed_provisional,
                })
                .unwrap_or_default()
        })
    }

    /// Call sites of every frame up to this one, innermost first.
    pub(crate) fn call_stack(&self) -> Vec<Info> {
        RESOLVING.with_borrow(|stack| {
            stack
                .frames
                .iter()
                .take(self.depth + 1)
                .rev()
                .map(|frame| frame.info.clone())
                .collect()
        })
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|stack| {
            while stack.frames.len() > self.depth {
                if let Some(frame) = stack.frames.pop() {
                    stack.index.remove(&frame.signature);
                }
            }
        });
    }
}
