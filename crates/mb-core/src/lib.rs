//! mb-core: shared types, handle IDs, errors, configuration, and MIME sniffing.
//!
//! This crate is the foundational dependency for all other mb-* crates,
//! providing the opaque [`Handle`] identifier, a unified error type, the
//! wire-level result types returned across the bridge, application
//! configuration, and leading-byte file-type detection.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod mime;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::Handle;
pub use media::*;
