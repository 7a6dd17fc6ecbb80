//! Mediabridge - handle-based chunked access to large media files
//!
//! This library crate exposes the binary's configuration loading for
//! integration testing. The functionality itself lives in the `mb-*` crates.

pub mod config;

pub use mb_core;
pub use mb_handles;
pub use mb_picker;
pub use mb_transfer;
