//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! reader, transfer, upload, and picker sections. Every section defaults
//! sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Reference per-call read cap and default chunk size: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reader: ReaderConfig,
    pub transfer: TransferConfig,
    pub upload: UploadConfig,
    pub picker: PickerConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.reader.max_read_bytes == 0 {
            warnings.push("reader.max_read_bytes is 0; reads will return no data".into());
        }
        if self.reader.header_sniff_bytes == 0 {
            warnings.push("reader.header_sniff_bytes is 0; sniffing always yields octet-stream".into());
        }
        if self.transfer.chunk_size == 0 {
            warnings.push("transfer.chunk_size is 0; the default of 4 MiB will be used".into());
        }
        if self.transfer.chunk_size > self.reader.max_read_bytes && self.reader.max_read_bytes > 0 {
            warnings.push(format!(
                "transfer.chunk_size ({}) exceeds reader.max_read_bytes ({}); chunks will be clamped",
                self.transfer.chunk_size, self.reader.max_read_bytes
            ));
        }
        if self.upload.retry_attempts == 0 {
            warnings.push("upload.retry_attempts is 0; each chunk is still attempted once".into());
        }
        if self.upload.backoff == BackoffKind::Exponential
            && self.upload.max_retry_delay_ms < self.upload.retry_delay_ms
        {
            warnings.push("upload.max_retry_delay_ms is below upload.retry_delay_ms".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Byte-range reader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Cap applied to every single read, regardless of requested length.
    pub max_read_bytes: u64,
    /// Bytes read from offset 0 for signature sniffing.
    pub header_sniff_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_read_bytes: DEFAULT_CHUNK_SIZE,
            header_sniff_bytes: crate::mime::SNIFF_LEN,
        }
    }
}

/// Chunk iteration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub chunk_size: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Growth function between upload retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Retry-wrapped uploader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Total attempts per chunk, including the first.
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    pub backoff: BackoffKind,
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_retry_delay() -> u64 {
    30_000
}

impl UploadConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: default_retry_delay(),
            backoff: BackoffKind::Fixed,
            max_retry_delay_ms: default_max_retry_delay(),
        }
    }
}

/// Media selector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Applied when a multi-select request does not set `maxCount`; 0 = unlimited.
    pub default_max_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.reader.max_read_bytes, 4 * 1024 * 1024);
        assert_eq!(cfg.reader.header_sniff_bytes, 16);
        assert_eq!(cfg.transfer.chunk_size, 4 * 1024 * 1024);
        assert_eq!(cfg.upload.retry_attempts, 3);
        assert_eq!(cfg.upload.retry_delay(), Duration::from_secs(1));
        assert_eq!(cfg.upload.backoff, BackoffKind::Fixed);
    }

    #[test]
    fn default_config_no_warnings() {
        let warnings = Config::default().validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn parse_toml_config() {
        let toml = r#"
            [upload]
            retry_attempts = 5
            backoff = "exponential"
        "#;
        let cfg = Config::from_toml(toml).unwrap();
        assert_eq!(cfg.upload.retry_attempts, 5);
        assert_eq!(cfg.upload.backoff, BackoffKind::Exponential);
        assert_eq!(cfg.upload.retry_delay_ms, 1000);
        assert_eq!(cfg.reader.max_read_bytes, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.transfer.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn parse_error_is_validation() {
        let err = Config::from_toml("[reader]\nmax_read_bytes = \"lots\"").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn zero_values_warn() {
        let mut cfg = Config::default();
        cfg.reader.max_read_bytes = 0;
        cfg.transfer.chunk_size = 0;
        cfg.upload.retry_attempts = 0;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("max_read_bytes")));
        assert!(warnings.iter().any(|w| w.contains("chunk_size")));
        assert!(warnings.iter().any(|w| w.contains("retry_attempts")));
    }

    #[test]
    fn oversized_chunk_warns() {
        let mut cfg = Config::default();
        cfg.transfer.chunk_size = cfg.reader.max_read_bytes * 2;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.upload.retry_attempts, 3);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/mediabridge.toml")));
        assert_eq!(cfg.transfer.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn load_or_default_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediabridge.toml");
        std::fs::write(&path, "[transfer]\nchunk_size = 1024\n").unwrap();
        let cfg = Config::load_or_default(Some(&path));
        assert_eq!(cfg.transfer.chunk_size, 1024);
    }
}
