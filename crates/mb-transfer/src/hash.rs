//! Streaming SHA-256 over an open handle.

use async_trait::async_trait;
use mb_core::config::{TransferConfig, DEFAULT_CHUNK_SIZE};
use mb_core::{Handle, Result};
use mb_handles::HandleRegistry;
use sha2::{Digest, Sha256};

use crate::iterator::{ChunkIterator, ChunkSink};

/// Computes lowercase hex SHA-256 digests by chunk iteration.
///
/// Memory use is bounded by the chunk size; the file is never loaded whole.
#[derive(Debug, Clone)]
pub struct StreamingHasher {
    registry: HandleRegistry,
    chunk_size: u64,
}

impl StreamingHasher {
    pub fn new(registry: HandleRegistry) -> Self {
        Self {
            registry,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Hasher reading in the configured chunk size. Zero falls back to the
    /// default.
    pub fn with_config(registry: HandleRegistry, cfg: &TransferConfig) -> Self {
        let chunk_size = match cfg.chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            n => n,
        };
        Self {
            registry,
            chunk_size,
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Digest of the full contents of `handle`, read in the default chunk size.
    pub async fn hash(&self, handle: Handle) -> Result<String> {
        self.hash_with_chunk_size(handle, self.chunk_size).await
    }

    /// Digest of the full contents of `handle` using `chunk_size` reads.
    /// The result does not depend on `chunk_size`.
    pub async fn hash_with_chunk_size(&self, handle: Handle, chunk_size: u64) -> Result<String> {
        let mut sink = DigestSink::default();
        let bytes = ChunkIterator::new(self.registry.clone(), handle)
            .with_chunk_size(chunk_size)
            .run_with(&mut sink)
            .await?;

        let digest = hex::encode(sink.hasher.finalize());
        tracing::debug!(handle = %handle, bytes, digest = %digest, "hash complete");
        Ok(digest)
    }
}

#[derive(Default)]
struct DigestSink {
    hasher: Sha256,
}

#[async_trait]
impl ChunkSink for DigestSink {
    async fn on_chunk(&mut self, chunk: &[u8], _offset: u64) -> Result<()> {
        self.hasher.update(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mb_core::Error;
    use std::io::Write;

    fn temp_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[tokio::test]
    async fn digest_is_independent_of_chunk_size() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 253) as u8).collect();
        let tmp = temp_file(&data);
        let reg = HandleRegistry::default();
        let h = reg.open(tmp.path().to_str().unwrap()).unwrap();
        let hasher = StreamingHasher::new(reg.clone());

        let expected = hex::encode(Sha256::digest(&data));
        for chunk_size in [1u64, 17, data.len() as u64 + 1] {
            let digest = hasher.hash_with_chunk_size(h, chunk_size).await.unwrap();
            assert_eq!(digest, expected, "chunk_size={chunk_size}");
        }
        assert_eq!(hasher.hash(h).await.unwrap(), expected);
        reg.close(h);
    }

    #[tokio::test]
    async fn configured_chunk_size_is_used() {
        let data: Vec<u8> = (0..300u32).map(|i| (i * 7 % 251) as u8).collect();
        let tmp = temp_file(&data);
        let reg = HandleRegistry::default();
        let h = reg.open(tmp.path().to_str().unwrap()).unwrap();

        let hasher = StreamingHasher::with_config(reg.clone(), &TransferConfig { chunk_size: 64 });
        assert_eq!(hasher.chunk_size(), 64);
        assert_eq!(hasher.hash(h).await.unwrap(), hex::encode(Sha256::digest(&data)));

        let zero = StreamingHasher::with_config(reg.clone(), &TransferConfig { chunk_size: 0 });
        assert_eq!(zero.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(StreamingHasher::new(reg.clone()).chunk_size(), DEFAULT_CHUNK_SIZE);
        reg.close(h);
    }

    #[tokio::test]
    async fn empty_file_digest() {
        let tmp = temp_file(b"");
        let reg = HandleRegistry::default();
        let h = reg.open(tmp.path().to_str().unwrap()).unwrap();
        let digest = StreamingHasher::new(reg).hash(h).await.unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn closed_handle_fails() {
        let tmp = temp_file(b"abc");
        let reg = HandleRegistry::default();
        let h = reg.open(tmp.path().to_str().unwrap()).unwrap();
        reg.close(h);
        let err = StreamingHasher::new(reg).hash(h).await.unwrap_err();
        assert_matches!(err, Error::InvalidHandle(_));
    }
}
