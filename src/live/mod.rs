//! Debounced as-you-type classification
//!
//! Every keystroke cancels the pending debounce timer; the request that
//! eventually fires is guarded so at most one is in flight at a time.

mod analyzer;

pub use analyzer::{LiveAnalyzer, LiveUpdate};
