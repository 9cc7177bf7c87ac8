//! Stack growth for deep resolution.
//!
//! Resolution recurses once per nested expression and once per
//! specialization on the call graph, so a deep program or a long call
//! chain can exhaust the native stack. Recursive entry points run inside
//! [`ensure_sufficient_stack`], which grows the stack on demand.

/// If less than this remains, grow before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Space added per growth (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
