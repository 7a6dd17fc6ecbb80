//! Wire-level types returned across the bridge.
//!
//! Everything here serializes in camelCase because these shapes are what a
//! host application (JavaScript, Swift, Kotlin) receives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ---------------------------------------------------------------------------
// FileStat
// ---------------------------------------------------------------------------

/// Metadata captured when a handle was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// Total byte length, fixed at open time.
    pub size: u64,
    /// Best-effort content type.
    pub mime: Option<String>,
    /// Best-effort display name.
    pub name: Option<String>,
    /// The reference string the handle was opened with.
    pub uri: String,
}

// ---------------------------------------------------------------------------
// ReadChunk
// ---------------------------------------------------------------------------

/// Result of one bounded `readBase64` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadChunk {
    /// Absolute offset the read started at (echoes the request).
    pub offset: u64,
    /// Number of bytes actually read.
    pub bytes_read: u64,
    /// `offset + bytes_read >= size`, or nothing could be read.
    pub eof: bool,
    /// Standard base64 of the bytes read, padded, no line wrapping.
    pub base64: String,
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Coarse media category requested from the selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    #[default]
    Any,
}

impl MediaKind {
    /// Whether a MIME type belongs to this kind.
    ///
    /// `Any` accepts everything, including unknown types.
    pub fn accepts(&self, mime: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Image => mime.is_some_and(|m| m.starts_with("image/")),
            Self::Video => mime.is_some_and(|m| m.starts_with("video/")),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" | "images" => Ok(Self::Image),
            "video" | "videos" => Ok(Self::Video),
            "any" | "all" => Ok(Self::Any),
            other => Err(Error::Validation(format!(
                "unknown media kind '{other}' (valid: image, video, any)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Options accepted by `select`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectOptions {
    /// Allow more than one asset to be returned.
    pub multiple: bool,
    /// Upper bound on returned assets; `0` means unlimited.
    pub max_count: u32,
    /// Optional MIME filter, e.g. `video/mp4` or `image/*`.
    pub media_type: Option<String>,
}

impl SelectOptions {
    /// Effective cap on the number of returned assets, if any.
    pub fn limit(&self) -> Option<usize> {
        if !self.multiple {
            Some(1)
        } else if self.max_count > 0 {
            Some(self.max_count as usize)
        } else {
            None
        }
    }

    /// Whether `mime` satisfies the `media_type` filter.
    pub fn matches_media_type(&self, mime: Option<&str>) -> bool {
        let Some(pattern) = self.media_type.as_deref() else {
            return true;
        };
        let Some(mime) = mime else {
            return false;
        };
        match pattern.strip_suffix("/*") {
            Some(prefix) => mime
                .split_once('/')
                .is_some_and(|(top, _)| top.eq_ignore_ascii_case(prefix)),
            None => mime.eq_ignore_ascii_case(pattern),
        }
    }
}

/// One selected asset, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// MIME type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Duration in seconds, for time-based media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MediaAsset {
    /// An asset with only its URI known.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            file_name: None,
            file_size: None,
            mime_type: None,
            width: None,
            height: None,
            duration: None,
        }
    }
}

/// Outcome of a selection flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub assets: Vec<MediaAsset>,
    /// The user dismissed the UI without selecting anything.
    pub canceled: bool,
}

impl SelectionResult {
    pub fn canceled() -> Self {
        Self {
            assets: Vec::new(),
            canceled: true,
        }
    }
}
