//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - Lossy text reads and writes with consistent error handling

pub mod io;
