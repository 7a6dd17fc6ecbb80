//! The backend trait behind the media selector.

use async_trait::async_trait;
use mb_core::{MediaAsset, MediaKind, Result, SelectOptions};

/// What a picker backend reports once its UI flow ends.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// The user confirmed a selection. May be empty.
    Picked(Vec<MediaAsset>),
    /// The user dismissed the UI.
    Dismissed,
}

/// A platform media-selection flow.
///
/// Implementations present whatever native UI the platform offers and
/// suspend until the user responds. They may pre-filter by `kind` and
/// `options`, but the [`MediaSelector`](crate::MediaSelector) normalizes the
/// result regardless.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &'static str;

    /// Run the selection flow to completion.
    async fn present(&self, kind: MediaKind, options: &SelectOptions) -> Result<PickOutcome>;
}
