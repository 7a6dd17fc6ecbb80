//! File-type detection from leading byte signatures and file extensions.

use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected by [`detect_mime`].
pub const SNIFF_LEN: usize = 16;

/// Fallback type when no signature matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// `AVI ` form type inside a RIFF header.
const AVI_FORM: &[u8] = &[0x41, 0x56, 0x49, 0x20];

/// Prefix signatures, checked in order.
const SIGNATURES: &[(&[u8], &str)] = &[
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (&[0x89, 0x50, 0x4E, 0x47], "image/png"),
    (&[0x47, 0x49, 0x46, 0x38], "image/gif"),
    (&[0x00, 0x00, 0x01, 0xB3], "video/mpeg"),
    (&[0x66, 0x74, 0x79, 0x70], "video/mp4"),
    (&[0x1A, 0x45, 0xDF, 0xA3], "video/webm"),
    (&[0x25, 0x50, 0x44, 0x46], "application/pdf"),
    (&[0x50, 0x4B, 0x03, 0x04], "application/zip"),
];

/// Map the first bytes of a file to a MIME type.
///
/// Only the first [`SNIFF_LEN`] bytes are considered. `RIFF` headers map to
/// `video/avi` only when the `AVI ` form type also appears in that window;
/// anything unrecognised is [`OCTET_STREAM`].
pub fn detect_mime(header: &[u8]) -> &'static str {
    let header = &header[..header.len().min(SNIFF_LEN)];

    if header.starts_with(b"RIFF") && header.windows(AVI_FORM.len()).any(|w| w == AVI_FORM) {
        return "video/avi";
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| header.starts_with(magic))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Like [`detect_mime`], but `None` instead of [`OCTET_STREAM`].
pub fn known_mime(header: &[u8]) -> Option<&'static str> {
    match detect_mime(header) {
        OCTET_STREAM => None,
        mime => Some(mime),
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the current position of `reader` and
/// detect a known type.
pub fn sniff_reader<R: Read>(reader: R) -> std::io::Result<Option<&'static str>> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(known_mime(&header))
}

/// Guess a MIME type from a file extension (case-insensitive).
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/avi",
        "mpg" | "mpeg" => "video/mpeg",
        "ts" => "video/mp2t",
        "3gp" => "video/3gpp",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Guess a MIME type from a path's extension.
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_from_extension)
}
