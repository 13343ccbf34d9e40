//! Configuration types
//!
//! Plain structs with defaults; loading them is the embedder's job.

pub mod types;

pub use types::*;
