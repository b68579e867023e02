//! Stack safety for recursive type walks.

/// Ensure sufficient stack space for recursive operations.
///
/// Grows the stack if remaining space is less than 256KB, allocating up to
/// 2MB, so deeply nested types cannot overflow the subtyping walk.
pub fn ensure_sufficient_stack<R, F: FnOnce() -> R>(f: F) -> R {
    stacker::maybe_grow(256 * 1024, 2 * 1024 * 1024, f)
}
