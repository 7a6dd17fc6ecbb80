//! Scoped acquisition over the raw handle API.

use mb_core::{FileStat, Handle, ReadChunk, Result};

use crate::reader::RangeRead;
use crate::registry::HandleRegistry;

/// Owns one handle and closes it when dropped.
///
/// The registry itself never closes handles on its own; this guard gives
/// callers release on every exit path, including early returns and panics.
#[derive(Debug)]
pub struct ScopedHandle {
    registry: HandleRegistry,
    handle: Handle,
    closed: bool,
}

impl ScopedHandle {
    pub(crate) fn new(registry: HandleRegistry, handle: Handle) -> Self {
        Self {
            registry,
            handle,
            closed: false,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn stat(&self) -> Result<FileStat> {
        self.registry.stat(self.handle)
    }

    pub fn read_bytes(&self, offset: u64, length: u64) -> Result<RangeRead> {
        self.registry.read_bytes(self.handle, offset, length)
    }

    pub fn read_base64(&self, offset: u64, length: u64) -> Result<ReadChunk> {
        self.registry.read_base64(self.handle, offset, length)
    }

    pub fn playable_uri(&self) -> Result<String> {
        self.registry.playable_uri(self.handle)
    }

    /// Close now instead of at end of scope.
    pub fn close(mut self) {
        self.release();
    }

    /// Give up ownership without closing; the caller must close the handle.
    pub fn into_raw(mut self) -> Handle {
        self.closed = true;
        self.handle
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.registry.close(self.handle);
        }
    }
}

impl Drop for ScopedHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn drop_closes_handle() {
        let tmp = temp_file(b"0123456789");
        let reg = HandleRegistry::default();
        let handle = {
            let scoped = reg.open_scoped(tmp.path().to_str().unwrap()).unwrap();
            assert_eq!(scoped.stat().unwrap().size, 10);
            scoped.handle()
        };
        assert!(!reg.contains(handle));
    }

    #[test]
    fn early_return_still_closes() {
        fn fails_midway(reg: &HandleRegistry, uri: &str) -> Result<u64> {
            let scoped = reg.open_scoped(uri)?;
            let _ = scoped.read_bytes(0, 2)?;
            Err(mb_core::Error::Internal("bail".into()))
        }

        let tmp = temp_file(b"abcdef");
        let reg = HandleRegistry::default();
        assert!(fails_midway(&reg, tmp.path().to_str().unwrap()).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn into_raw_keeps_handle_open() {
        let tmp = temp_file(b"abc");
        let reg = HandleRegistry::default();
        let scoped = reg.open_scoped(tmp.path().to_str().unwrap()).unwrap();
        let handle = scoped.into_raw();
        assert!(reg.contains(handle));
        reg.close(handle);
        assert!(reg.is_empty());
    }

    #[test]
    fn explicit_close() {
        let tmp = temp_file(b"abc");
        let reg = HandleRegistry::default();
        let scoped = reg.open_scoped(tmp.path().to_str().unwrap()).unwrap();
        let handle = scoped.handle();
        scoped.close();
        assert!(!reg.contains(handle));
    }
}
