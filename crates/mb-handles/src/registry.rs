//! Process-wide table of open file handles.
//!
//! [`HandleRegistry`] issues monotonically increasing [`Handle`]s and owns
//! every open source exclusively. Distinct handles are fully independent;
//! operations on one handle are serialized by that record's lock so a seek
//! and its read can never interleave with another caller's.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use mb_core::config::ReaderConfig;
use mb_core::mime::{detect_mime, known_mime};
use mb_core::{Error, FileStat, Handle, ReadChunk, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::reader::{ByteRangeReader, RangeRead};
use crate::resolver::{FsResolver, UriResolver};
use crate::scoped::ScopedHandle;

static GLOBAL: Lazy<HandleRegistry> = Lazy::new(HandleRegistry::default);

/// One registry entry.
struct HandleRecord {
    reader: Mutex<ByteRangeReader>,
    stat: FileStat,
}

impl HandleRecord {
    /// A record can outlive its map entry in a caller's `Arc`; once the
    /// reader is released it refuses further reads.
    fn read(&self, handle: Handle, offset: u64, length: u64) -> Result<RangeRead> {
        let mut reader = self.reader.lock();
        if reader.is_released() {
            return Err(Error::InvalidHandle(handle));
        }
        reader
            .read_at(offset, length)
            .map_err(|e| Error::read(handle, e))
    }
}

struct Inner {
    next_id: AtomicU64,
    entries: DashMap<Handle, Arc<HandleRecord>>,
    resolver: Arc<dyn UriResolver>,
    config: ReaderConfig,
}

/// Thread-safe handle table. Cloning yields another view of the same table.
#[derive(Clone)]
pub struct HandleRegistry {
    inner: Arc<Inner>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new(ReaderConfig::default())
    }
}

impl HandleRegistry {
    /// Create a registry backed by the filesystem resolver.
    pub fn new(config: ReaderConfig) -> Self {
        Self::with_resolver(Arc::new(FsResolver::new()), config)
    }

    /// Create a registry backed by a custom resolver.
    pub fn with_resolver(resolver: Arc<dyn UriResolver>, config: ReaderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                entries: DashMap::new(),
                resolver,
                config,
            }),
        }
    }

    /// The process-wide registry, created on first use with default settings.
    ///
    /// There is no automatic teardown; handles left open stay open until
    /// [`close`](Self::close) or process exit.
    pub fn global() -> &'static HandleRegistry {
        &GLOBAL
    }

    /// Open `uri` and return a fresh handle.
    ///
    /// Handles are never reused, even after close.
    pub fn open(&self, uri: &str) -> Result<Handle> {
        let resolved = self.inner.resolver.resolve(uri).map_err(|e| {
            tracing::debug!(uri, resolver = self.inner.resolver.name(), error = %e, "open failed");
            e
        })?;

        let mut reader =
            ByteRangeReader::new(resolved.source, resolved.size, self.inner.config.max_read_bytes);

        let mime = match resolved.mime {
            Some(mime) => Some(mime),
            None => sniff(&mut reader, self.inner.config.header_sniff_bytes, uri),
        };

        let handle = Handle::from_raw(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let stat = FileStat {
            size: resolved.size,
            mime,
            name: resolved.name,
            uri: uri.to_owned(),
        };

        tracing::debug!(
            handle = %handle,
            uri,
            size = stat.size,
            mime = stat.mime.as_deref().unwrap_or("-"),
            "opened"
        );

        self.inner.entries.insert(
            handle,
            Arc::new(HandleRecord {
                reader: Mutex::new(reader),
                stat,
            }),
        );
        Ok(handle)
    }

    /// Open `uri` and wrap the handle in a guard that closes on drop.
    pub fn open_scoped(&self, uri: &str) -> Result<ScopedHandle> {
        let handle = self.open(uri)?;
        Ok(ScopedHandle::new(self.clone(), handle))
    }

    /// Close `handle`. Unknown or already-closed handles are a no-op.
    ///
    /// Release failures are logged and the entry is dropped regardless.
    pub fn close(&self, handle: Handle) {
        let _ = self.remove(handle);
    }

    /// Like [`close`](Self::close) but reports unknown handles as
    /// [`Error::InvalidHandle`].
    pub fn try_close(&self, handle: Handle) -> Result<()> {
        if self.remove(handle) {
            Ok(())
        } else {
            Err(Error::InvalidHandle(handle))
        }
    }

    /// Close every open handle.
    pub fn close_all(&self) {
        let handles: Vec<Handle> = self.inner.entries.iter().map(|e| *e.key()).collect();
        for handle in handles {
            tracing::info!(handle = %handle, "closing leaked handle");
            self.close(handle);
        }
    }

    fn remove(&self, handle: Handle) -> bool {
        let Some((_, record)) = self.inner.entries.remove(&handle) else {
            tracing::trace!(handle = %handle, "close on unknown handle ignored");
            return false;
        };

        // Waits for any in-flight read on this handle to finish.
        let mut reader = record.reader.lock();
        if let Err(e) = reader.release() {
            tracing::warn!(handle = %handle, error = %e, "failed to release resource on close");
        }
        tracing::debug!(handle = %handle, "closed");
        true
    }

    /// Metadata captured at open time.
    pub fn stat(&self, handle: Handle) -> Result<FileStat> {
        Ok(self.record(handle)?.stat.clone())
    }

    /// The reference a native player can consume: the original URI.
    pub fn playable_uri(&self, handle: Handle) -> Result<String> {
        Ok(self.record(handle)?.stat.uri.clone())
    }

    /// Read up to `length` bytes at `offset`, returning raw bytes.
    ///
    /// `length` is silently clamped to the configured per-call cap.
    pub fn read_bytes(&self, handle: Handle, offset: u64, length: u64) -> Result<RangeRead> {
        let read = self.record(handle)?.read(handle, offset, length)?;
        tracing::trace!(
            handle = %handle,
            offset,
            requested = length,
            bytes_read = read.bytes_read(),
            eof = read.eof,
            "read"
        );
        Ok(read)
    }

    /// Read up to `length` bytes at `offset`, base64-encoded.
    pub fn read_base64(&self, handle: Handle, offset: u64, length: u64) -> Result<ReadChunk> {
        self.read_bytes(handle, offset, length).map(RangeRead::into_chunk)
    }

    /// Detect the content type from the first bytes of the resource.
    pub fn sniff_mime(&self, handle: Handle) -> Result<&'static str> {
        let read = self.read_bytes(handle, 0, self.inner.config.header_sniff_bytes as u64)?;
        Ok(detect_mime(&read.bytes))
    }

    /// Per-call read cap in bytes.
    pub fn max_read_bytes(&self) -> u64 {
        self.inner.config.max_read_bytes
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.entries.contains_key(&handle)
    }

    /// Number of currently open handles.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn record(&self, handle: Handle) -> Result<Arc<HandleRecord>> {
        self.inner
            .entries
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::InvalidHandle(handle))
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("open", &self.len())
            .field("resolver", &self.inner.resolver.name())
            .finish()
    }
}

/// Best-effort content sniffing at open time; failures become `None`.
fn sniff(reader: &mut ByteRangeReader, len: usize, uri: &str) -> Option<String> {
    match reader.read_at(0, len as u64) {
        Ok(read) => known_mime(&read.bytes).map(str::to_owned),
        Err(e) => {
            tracing::debug!(uri, error = %e, "mime sniff failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MediaSource, ResolvedSource};
    use assert_matches::assert_matches;
    use mb_core::mime::OCTET_STREAM;
    use std::io::{Cursor, Read, Seek, SeekFrom, Write};
    use std::sync::atomic::AtomicUsize;

    /// In-memory resolver: every URI resolves to the same bytes.
    struct MemResolver {
        data: Vec<u8>,
        releases: Arc<AtomicUsize>,
        fail_release: bool,
    }

    struct MemSource {
        inner: Cursor<Vec<u8>>,
        releases: Arc<AtomicUsize>,
        fail_release: bool,
    }

    impl Read for MemSource {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for MemSource {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl MediaSource for MemSource {
        fn release(&mut self) -> std::io::Result<()> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "busy"))
            } else {
                Ok(())
            }
        }
    }

    impl UriResolver for MemResolver {
        fn name(&self) -> &'static str {
            "mem"
        }

        fn resolve(&self, uri: &str) -> Result<ResolvedSource> {
            if uri.starts_with("missing:") {
                return Err(Error::open(uri, "not found"));
            }
            Ok(ResolvedSource {
                source: Box::new(MemSource {
                    inner: Cursor::new(self.data.clone()),
                    releases: self.releases.clone(),
                    fail_release: self.fail_release,
                }),
                size: self.data.len() as u64,
                name: None,
                mime: None,
            })
        }
    }

    fn mem_registry(data: &[u8], fail_release: bool) -> (HandleRegistry, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let resolver = MemResolver {
            data: data.to_vec(),
            releases: releases.clone(),
            fail_release,
        };
        let registry = HandleRegistry::with_resolver(Arc::new(resolver), ReaderConfig::default());
        (registry, releases)
    }

    #[test]
    fn handles_start_at_one_and_increase() {
        let (reg, _) = mem_registry(b"abc", false);
        let a = reg.open("mem:a").unwrap();
        let b = reg.open("mem:b").unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn closed_ids_are_not_reused() {
        let (reg, _) = mem_registry(b"abc", false);
        let a = reg.open("mem:a").unwrap();
        reg.close(a);
        let b = reg.open("mem:b").unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn open_failure_allocates_nothing() {
        let (reg, _) = mem_registry(b"abc", false);
        assert_matches!(reg.open("missing:x"), Err(Error::Open { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn stat_reports_captured_metadata() {
        let (reg, _) = mem_registry(b"%PDF-1.4 body", false);
        let h = reg.open("mem:doc").unwrap();
        let stat = reg.stat(h).unwrap();
        assert_eq!(stat.size, 13);
        assert_eq!(stat.uri, "mem:doc");
        assert_eq!(stat.name, None);
        // Resolver gave no mime, so the header was sniffed.
        assert_eq!(stat.mime.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn unknown_signature_leaves_mime_empty() {
        let (reg, _) = mem_registry(b"plain text", false);
        let h = reg.open("mem:txt").unwrap();
        assert_eq!(reg.stat(h).unwrap().mime, None);
        assert_eq!(reg.sniff_mime(h).unwrap(), OCTET_STREAM);
    }

    #[test]
    fn playable_uri_is_source_reference() {
        let (reg, _) = mem_registry(b"abc", false);
        let h = reg.open("mem:clip").unwrap();
        assert_eq!(reg.playable_uri(h).unwrap(), "mem:clip");
    }

    #[test]
    fn close_releases_exactly_once() {
        let (reg, releases) = mem_registry(b"abc", false);
        let h = reg.open("mem:a").unwrap();
        reg.close(h);
        reg.close(h);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!reg.contains(h));
    }

    #[test]
    fn failed_release_still_drops_entry() {
        let (reg, releases) = mem_registry(b"abc", true);
        let h = reg.open("mem:a").unwrap();
        reg.close(h);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_matches!(reg.stat(h), Err(Error::InvalidHandle(_)));
    }

    #[test]
    fn record_held_across_close_refuses_reads() {
        let (reg, releases) = mem_registry(b"abcdef", false);
        let h = reg.open("mem:a").unwrap();
        let record = reg.record(h).unwrap();
        assert_eq!(record.read(h, 0, 3).unwrap().bytes, b"abc");

        reg.close(h);
        assert_matches!(record.read(h, 0, 3), Err(Error::InvalidHandle(x)) if x == h);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_close_flags_unknown_handles() {
        let (reg, _) = mem_registry(b"abc", false);
        let h = reg.open("mem:a").unwrap();
        assert!(reg.try_close(h).is_ok());
        assert_matches!(reg.try_close(h), Err(Error::InvalidHandle(x)) if x == h);
    }

    #[test]
    fn operations_on_unknown_handle_fail() {
        let (reg, _) = mem_registry(b"abc", false);
        let bogus = Handle::from_raw(99);
        assert_matches!(reg.stat(bogus), Err(Error::InvalidHandle(_)));
        assert_matches!(reg.playable_uri(bogus), Err(Error::InvalidHandle(_)));
        assert_matches!(reg.read_base64(bogus, 0, 1), Err(Error::InvalidHandle(_)));
        assert_matches!(reg.sniff_mime(bogus), Err(Error::InvalidHandle(_)));
    }

    #[test]
    fn close_all_empties_table() {
        let (reg, releases) = mem_registry(b"abc", false);
        reg.open("mem:a").unwrap();
        reg.open("mem:b").unwrap();
        reg.close_all();
        assert!(reg.is_empty());
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn read_base64_clamps_to_cap() {
        let releases = Arc::new(AtomicUsize::new(0));
        let resolver = MemResolver {
            data: vec![7u8; 64],
            releases,
            fail_release: false,
        };
        let cfg = ReaderConfig {
            max_read_bytes: 16,
            ..ReaderConfig::default()
        };
        let reg = HandleRegistry::with_resolver(Arc::new(resolver), cfg);
        let h = reg.open("mem:big").unwrap();
        let chunk = reg.read_base64(h, 0, 1000).unwrap();
        assert_eq!(chunk.bytes_read, 16);
        assert!(!chunk.eof);
    }

    #[test]
    fn global_registry_is_shared() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GIF89a").unwrap();
        let uri = file.path().to_str().unwrap().to_string();

        let h = HandleRegistry::global().open(&uri).unwrap();
        assert!(std::ptr::eq(HandleRegistry::global(), HandleRegistry::global()));
        let stat = HandleRegistry::global().stat(h).unwrap();
        assert_eq!(stat.size, 6);
        assert_eq!(stat.mime.as_deref(), Some("image/gif"));

        HandleRegistry::global().try_close(h).unwrap();
        assert!(!HandleRegistry::global().contains(h));
    }

    #[test]
    fn concurrent_reads_on_one_handle_stay_consistent() {
        let data: Vec<u8> = (0..=255u8).collect();
        let (reg, _) = mem_registry(&data, false);
        let h = reg.open("mem:bytes").unwrap();

        let threads: Vec<_> = (0..8u64)
            .map(|t| {
                let reg = reg.clone();
                std::thread::spawn(move || {
                    for i in 0..64u64 {
                        let offset = (t * 31 + i * 7) % 250;
                        let read = reg.read_bytes(h, offset, 4).unwrap();
                        let expected: Vec<u8> = (offset..offset + 4).map(|b| b as u8).collect();
                        assert_eq!(read.bytes, expected);
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }
    }
}
