//! Retry-wrapped chunk uploads.
//!
//! [`upload`] composes the [`ChunkIterator`] with a caller-supplied
//! [`UploadFn`]. Each chunk is retried on its own; once a chunk exhausts its
//! attempts the upload stops and nothing already delivered is rolled back.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mb_core::config::{BackoffKind, UploadConfig, DEFAULT_CHUNK_SIZE};
use mb_core::error::BoxError;
use mb_core::{Error, Handle, Result};
use mb_handles::HandleRegistry;

use crate::iterator::{ChunkIterator, ChunkSink};
use crate::progress::ProgressSender;

/// Caller-supplied sink receiving one chunk at a time.
///
/// Network transport, authentication and resumability all live behind this
/// trait; the uploader only sequences and retries calls to it.
#[async_trait]
pub trait UploadFn: Send + Sync {
    async fn upload(&self, chunk: &[u8], offset: u64) -> std::result::Result<(), BoxError>;
}

/// Adapter turning an async closure into an [`UploadFn`].
pub struct FnUpload<F>(F);

/// Build an [`UploadFn`] from `|bytes, offset| async move { ... }`.
pub fn upload_fn<F, Fut>(f: F) -> FnUpload<F>
where
    F: Fn(Vec<u8>, u64) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send,
{
    FnUpload(f)
}

#[async_trait]
impl<F, Fut> UploadFn for FnUpload<F>
where
    F: Fn(Vec<u8>, u64) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send,
{
    async fn upload(&self, chunk: &[u8], offset: u64) -> std::result::Result<(), BoxError> {
        (self.0)(chunk.to_vec(), offset).await
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Wait growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed,
    /// `delay * 2^(attempt - 1)`, capped at `max`.
    Exponential { max: Duration },
}

/// Per-chunk retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, including the first. Zero behaves as one.
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl RetryPolicy {
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn from_config(cfg: &UploadConfig) -> Self {
        let backoff = match cfg.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max: cfg.max_retry_delay(),
            },
        };
        Self {
            attempts: cfg.retry_attempts,
            delay: cfg.retry_delay(),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Wait before the retry that follows failed attempt number `attempt`
    /// (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor).min(max)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Settings for one [`upload`] call.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: u64,
    pub retry: RetryPolicy,
    pub progress: Option<ProgressSender>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            progress: None,
        }
    }
}

impl UploadOptions {
    pub fn from_config(chunk_size: u64, cfg: &UploadConfig) -> Self {
        Self {
            chunk_size,
            retry: RetryPolicy::from_config(cfg),
            progress: None,
        }
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// What a completed upload did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub bytes: u64,
    pub chunks: u64,
    /// Attempts beyond the first, summed over all chunks.
    pub retries: u64,
}

/// Upload every chunk of `handle` through `sink`, strictly in offset order.
///
/// # Errors
///
/// [`Error::Upload`] carrying the last underlying cause once a chunk has
/// failed `retry.attempts` times. Later chunks are not attempted.
pub async fn upload(
    registry: &HandleRegistry,
    handle: Handle,
    sink: &dyn UploadFn,
    options: UploadOptions,
) -> Result<UploadSummary> {
    let mut iterator = ChunkIterator::new(registry.clone(), handle).with_chunk_size(options.chunk_size);
    if let Some(progress) = options.progress {
        iterator = iterator.with_progress(progress);
    }

    let mut retrying = RetryingSink {
        sink,
        policy: options.retry,
        summary: UploadSummary::default(),
    };
    iterator.run_with(&mut retrying).await?;

    tracing::info!(
        handle = %handle,
        bytes = retrying.summary.bytes,
        chunks = retrying.summary.chunks,
        retries = retrying.summary.retries,
        "upload complete"
    );
    Ok(retrying.summary)
}

struct RetryingSink<'a> {
    sink: &'a dyn UploadFn,
    policy: RetryPolicy,
    summary: UploadSummary,
}

#[async_trait]
impl<'a> ChunkSink for RetryingSink<'a> {
    async fn on_chunk(&mut self, chunk: &[u8], offset: u64) -> Result<()> {
        let max = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            match self.sink.upload(chunk, offset).await {
                Ok(()) => {
                    self.summary.bytes += chunk.len() as u64;
                    self.summary.chunks += 1;
                    return Ok(());
                }
                Err(e) if attempt >= max => {
                    tracing::error!(offset, attempt, error = %e, "chunk upload failed, giving up");
                    return Err(Error::upload(offset, attempt, e));
                }
                Err(e) => {
                    let wait = self.policy.delay_after(attempt);
                    tracing::warn!(
                        offset,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "chunk upload failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    self.summary.retries += 1;
                }
            }
        }
    }
}
