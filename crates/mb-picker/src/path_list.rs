//! A picker backend over a fixed list of local files.
//!
//! Stands in for the native UI on desktop and in tests: the "user" has
//! already chosen the paths. Each path is described the way a platform
//! picker would describe its result.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mb_core::mime::{mime_from_path, sniff_reader};
use mb_core::{Error, MediaAsset, MediaKind, Result, SelectOptions};

use crate::picker::{MediaPicker, PickOutcome};

/// Picks a pre-chosen set of paths. An empty list behaves as a dismissal.
#[derive(Debug, Clone, Default)]
pub struct PathListPicker {
    paths: Vec<PathBuf>,
}

impl PathListPicker {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[async_trait]
impl MediaPicker for PathListPicker {
    fn name(&self) -> &'static str {
        "path-list"
    }

    async fn present(&self, _kind: MediaKind, _options: &SelectOptions) -> Result<PickOutcome> {
        if self.paths.is_empty() {
            return Ok(PickOutcome::Dismissed);
        }

        let paths = self.paths.clone();
        let assets = tokio::task::spawn_blocking(move || {
            paths
                .iter()
                .filter_map(|path| match describe(path) {
                    Ok(asset) => Some(asset),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable selection");
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| Error::Picker(format!("describe task failed: {e}")))?;

        Ok(PickOutcome::Picked(assets))
    }
}

/// Build a [`MediaAsset`] for one local file.
///
/// Size and a `file://` URI are required; name, type and pixel dimensions
/// are best effort.
pub fn describe(path: &Path) -> Result<MediaAsset> {
    let meta = std::fs::metadata(path)?;
    if meta.is_dir() {
        return Err(Error::Picker(format!("{} is a directory", path.display())));
    }

    let absolute = std::fs::canonicalize(path)?;
    let uri = url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| Error::Picker(format!("cannot express {} as a file URI", absolute.display())))?;

    let mime = mime_from_path(path)
        .map(str::to_string)
        .or_else(|| sniff(path));

    let (width, height) = match mime.as_deref() {
        Some(m) if m.starts_with("image/") => match image::image_dimensions(path) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no image dimensions");
                (None, None)
            }
        },
        _ => (None, None),
    };

    Ok(MediaAsset {
        uri,
        file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        file_size: Some(meta.len()),
        mime_type: mime,
        width,
        height,
        duration: None,
    })
}

fn sniff(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    sniff_reader(file).ok().flatten().map(str::to_string)
}
