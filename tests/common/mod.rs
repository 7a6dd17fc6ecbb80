//! Shared fixtures for integration tests.
//!
//! Provides [`Fixture`], a temporary directory with helpers for writing
//! deterministic test files, and a registry configured with the default
//! 4 MiB read cap.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mb_core::config::ReaderConfig;
use mb_handles::HandleRegistry;
use tempfile::TempDir;

/// Deterministic, non-repeating-looking bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 131 % 251) as u8).collect()
}

/// A temporary directory plus a fresh registry.
pub struct Fixture {
    pub dir: TempDir,
    pub registry: HandleRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_reader(ReaderConfig::default())
    }

    pub fn with_reader(config: ReaderConfig) -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            registry: HandleRegistry::new(config),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` to `name` and return the path as a string reference.
    pub fn write(&self, name: &str, bytes: &[u8]) -> String {
        let path = self.path(name);
        std::fs::write(&path, bytes).expect("failed to write fixture");
        path_str(&path)
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_str().expect("non-UTF-8 temp path").to_string()
}
