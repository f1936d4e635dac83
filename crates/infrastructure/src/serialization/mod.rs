//! Deterministic JSON output for report files.
//!
//! Reports are written with 2-space indentation and a trailing newline so
//! that successive runs diff cleanly.

mod json;

pub use json::*;
