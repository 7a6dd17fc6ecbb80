//! # mb-transfer
//!
//! Async consumers layered over the handle registry: sequential chunk
//! iteration, retry-wrapped chunk upload, and streaming SHA-256.
//!
//! Every consumer reads through the public `read_base64` operation, one
//! bounded chunk at a time, so none of them ever holds more than a single
//! chunk in memory.

pub mod hash;
pub mod iterator;
pub mod progress;
pub mod upload;

pub use hash::StreamingHasher;
pub use iterator::{fn_sink, ChunkIterator, ChunkSink, FnSink};
pub use progress::ProgressSender;
pub use upload::{
    upload, upload_fn, Backoff, FnUpload, RetryPolicy, UploadFn, UploadOptions, UploadSummary,
};
