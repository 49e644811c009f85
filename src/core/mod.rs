// Public modules
pub mod config;
pub mod error;
pub mod migrate;
pub mod patch;
pub mod report;
pub mod rewrite;
pub mod rules;
pub mod validate;
pub mod walker;

// Re-export common types for convenience
pub use config::PatchConfig;
pub use error::{Error, ErrorCode, Result};
