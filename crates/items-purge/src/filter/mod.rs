//! Deletion-closure filter.
//!
//! Runs in two steps: [`compute_closure`] decides what goes from the item
//! index alone, then [`apply`] records the removals on the document.

pub mod apply;
pub mod closure;

pub use apply::{apply, format_count, parse_count, ApplyOutcome};
pub use closure::{compute_closure, compute_closure_with, find_cycles, Closure};
