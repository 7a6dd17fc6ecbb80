//! Sequential chunk iteration over an open handle.
//!
//! [`ChunkIterator`] issues repeated bounded `read_base64` calls, decodes each
//! payload, and hands the bytes to a [`ChunkSink`], awaiting it before the
//! next read. There is no read-ahead and no concurrent chunk processing:
//! chunks arrive in strictly increasing, contiguous offset order.

use std::future::Future;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mb_core::config::DEFAULT_CHUNK_SIZE;
use mb_core::{Error, Handle, ReadChunk, Result};
use mb_handles::HandleRegistry;

use crate::progress::ProgressSender;

/// Consumer of chunks produced by a [`ChunkIterator`].
#[async_trait]
pub trait ChunkSink: Send {
    /// Consume one chunk. An error stops iteration and is returned to the
    /// caller of [`ChunkIterator::run_with`].
    async fn on_chunk(&mut self, chunk: &[u8], offset: u64) -> Result<()>;
}

/// Adapter turning an async closure into a [`ChunkSink`].
pub struct FnSink<F>(F);

/// Build a [`ChunkSink`] from `|bytes, offset| async move { ... }`.
pub fn fn_sink<F, Fut>(f: F) -> FnSink<F>
where
    F: FnMut(Vec<u8>, u64) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
{
    FnSink(f)
}

#[async_trait]
impl<F, Fut> ChunkSink for FnSink<F>
where
    F: FnMut(Vec<u8>, u64) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn on_chunk(&mut self, chunk: &[u8], offset: u64) -> Result<()> {
        (self.0)(chunk.to_vec(), offset).await
    }
}

/// Drives bounded reads across one handle until end-of-file.
#[derive(Debug, Clone)]
pub struct ChunkIterator {
    registry: HandleRegistry,
    handle: Handle,
    chunk_size: u64,
    progress: Option<ProgressSender>,
}

impl ChunkIterator {
    /// Iterate `handle` with the default 4 MiB chunk size.
    pub fn new(registry: HandleRegistry, handle: Handle) -> Self {
        Self {
            registry,
            handle,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress: None,
        }
    }

    /// Builder: set the requested chunk size. Zero selects the default.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    /// Builder: report `(offset + bytes_read, size)` after every chunk.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Read through the whole handle without a chunk consumer.
    ///
    /// Returns the total number of bytes read.
    pub async fn run(&self) -> Result<u64> {
        self.drive(None).await
    }

    /// Read through the whole handle, delivering every chunk to `sink`.
    ///
    /// Returns the total number of bytes delivered. A short file ends
    /// cleanly at its first end-of-file read; that is not an error here.
    pub async fn run_with(&self, sink: &mut dyn ChunkSink) -> Result<u64> {
        self.drive(Some(sink)).await
    }

    async fn drive(&self, mut sink: Option<&mut dyn ChunkSink>) -> Result<u64> {
        let size = self.registry.stat(self.handle)?.size;
        let mut offset = 0u64;

        tracing::debug!(
            handle = %self.handle,
            size,
            chunk_size = self.chunk_size,
            "iteration started"
        );

        loop {
            let chunk = self.read(offset).await?;
            let bytes = STANDARD
                .decode(chunk.base64.as_bytes())
                .map_err(|e| Error::Decode(format!("chunk at offset {offset}: {e}")))?;
            let read = bytes.len() as u64;

            if read > 0 {
                if let Some(sink) = sink.as_deref_mut() {
                    sink.on_chunk(&bytes, offset).await?;
                }
                if let Some(progress) = &self.progress {
                    progress.send(offset + read, size);
                }
            }

            offset += read;
            if chunk.eof || read == 0 || offset >= size {
                break;
            }
        }

        if offset < size {
            tracing::warn!(
                handle = %self.handle,
                delivered = offset,
                size,
                "source ended before its recorded size"
            );
        }
        tracing::debug!(handle = %self.handle, delivered = offset, "iteration finished");
        Ok(offset)
    }

    /// One blocking registry read, moved off the async worker.
    async fn read(&self, offset: u64) -> Result<ReadChunk> {
        let registry = self.registry.clone();
        let handle = self.handle;
        let length = self.chunk_size;
        tokio::task::spawn_blocking(move || registry.read_base64(handle, offset, length))
            .await
            .map_err(|e| Error::Internal(format!("read task failed: {e}")))?
    }
}
