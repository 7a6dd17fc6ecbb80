//! URI resolution: turning a caller's reference string into an open source.
//!
//! [`UriResolver`] is the seam where platform backends (content providers,
//! photo libraries) plug in. [`FsResolver`] handles `file://` URIs and bare
//! filesystem paths.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use mb_core::mime::mime_from_path;
use mb_core::{Error, Result};
use url::Url;

/// A readable, seekable byte source owned by one registry record.
pub trait MediaSource: Read + Seek + Send {
    /// Release the underlying OS resource.
    ///
    /// Called exactly once by the registry on close. Errors are logged by the
    /// caller and never surfaced.
    fn release(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl MediaSource for File {}

impl MediaSource for Cursor<Vec<u8>> {}

/// An opened source plus the metadata captured at open time.
pub struct ResolvedSource {
    pub source: Box<dyn MediaSource>,
    /// Total byte length.
    pub size: u64,
    /// Best-effort display name.
    pub name: Option<String>,
    /// Best-effort content type.
    pub mime: Option<String>,
}

impl std::fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("size", &self.size)
            .field("name", &self.name)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

/// Resolves reference strings to open sources.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait UriResolver: Send + Sync {
    /// Human-readable name identifying this resolver implementation.
    fn name(&self) -> &'static str;

    /// Open `uri` for reading.
    ///
    /// Fails with [`Error::Open`] when the resource is missing, unreadable,
    /// or uses a scheme this resolver does not handle. Metadata lookups
    /// (name, mime) must not fail the call; they become `None` instead.
    fn resolve(&self, uri: &str) -> Result<ResolvedSource>;
}

/// Resolver for `file://` URIs and plain filesystem paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        Self
    }

    /// Map a reference string to a filesystem path.
    pub fn path_for(uri: &str) -> Result<PathBuf> {
        if uri.trim().is_empty() {
            return Err(Error::open(uri, "empty URI"));
        }

        match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|()| Error::open(uri, "file URI does not name a local path")),
            // Windows drive letters parse as a one-letter scheme.
            Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(uri)),
            Ok(url) => Err(Error::open(
                uri,
                format!("unsupported URI scheme '{}'", url.scheme()),
            )),
            Err(_) => Ok(PathBuf::from(uri)),
        }
    }
}

impl UriResolver for FsResolver {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn resolve(&self, uri: &str) -> Result<ResolvedSource> {
        let path = Self::path_for(uri)?;
        let file = File::open(&path).map_err(|e| Error::open(uri, e))?;
        let metadata = file.metadata().map_err(|e| Error::open(uri, e))?;
        if metadata.is_dir() {
            return Err(Error::open(uri, "is a directory"));
        }

        Ok(ResolvedSource {
            source: Box::new(file),
            size: metadata.len(),
            name: display_name(&path),
            mime: mime_from_path(&path).map(str::to_owned),
        })
    }
}

fn display_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
