//! Single-flight media selection with result normalization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mb_core::config::PickerConfig;
use mb_core::{Error, MediaAsset, MediaKind, Result, SelectOptions, SelectionResult};

use crate::picker::{MediaPicker, PickOutcome};

/// Front door for media selection.
///
/// Only one flow may be outstanding per selector. A second `select` while
/// one is pending fails with [`Error::SelectionInProgress`] instead of
/// queueing.
pub struct MediaSelector {
    picker: Arc<dyn MediaPicker>,
    default_max_count: u32,
    in_flight: AtomicBool,
}

impl MediaSelector {
    pub fn new(picker: Arc<dyn MediaPicker>) -> Self {
        Self::with_config(picker, &PickerConfig::default())
    }

    pub fn with_config(picker: Arc<dyn MediaPicker>, config: &PickerConfig) -> Self {
        Self {
            picker,
            default_max_count: config.default_max_count,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a selection flow is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Present the picker and normalize what comes back.
    ///
    /// Dismissal, or a confirmed selection that ends up empty after
    /// filtering, is the `canceled: true` success path.
    pub async fn select(&self, kind: MediaKind, options: SelectOptions) -> Result<SelectionResult> {
        let _guard = FlightGuard::acquire(&self.in_flight)?;
        let options = self.effective_options(options);

        tracing::debug!(
            picker = self.picker.name(),
            kind = %kind,
            multiple = options.multiple,
            max_count = options.max_count,
            media_type = ?options.media_type,
            "presenting picker"
        );

        let picked = match self.picker.present(kind, &options).await? {
            PickOutcome::Picked(assets) => assets,
            PickOutcome::Dismissed => {
                tracing::debug!(picker = self.picker.name(), "selection dismissed");
                return Ok(SelectionResult::canceled());
            }
        };

        let assets = normalize(picked, kind, &options);
        if assets.is_empty() {
            tracing::debug!(picker = self.picker.name(), "nothing selected");
            return Ok(SelectionResult::canceled());
        }

        tracing::info!(picker = self.picker.name(), count = assets.len(), "selection complete");
        Ok(SelectionResult {
            assets,
            canceled: false,
        })
    }

    fn effective_options(&self, mut options: SelectOptions) -> SelectOptions {
        if options.multiple && options.max_count == 0 {
            options.max_count = self.default_max_count;
        }
        options
    }
}

impl std::fmt::Debug for MediaSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSelector")
            .field("picker", &self.picker.name())
            .field("default_max_count", &self.default_max_count)
            .field("in_flight", &self.is_busy())
            .finish()
    }
}

/// Drop kind and type mismatches, then apply the count limit.
fn normalize(assets: Vec<MediaAsset>, kind: MediaKind, options: &SelectOptions) -> Vec<MediaAsset> {
    let limit = options.limit().unwrap_or(usize::MAX);
    assets
        .into_iter()
        .filter(|a| {
            let mime = a.mime_type.as_deref();
            let keep = kind.accepts(mime) && options.matches_media_type(mime);
            if !keep {
                tracing::debug!(uri = %a.uri, mime = ?mime, "dropping asset outside requested type");
            }
            keep
        })
        .take(limit)
        .collect()
}

/// Clears the in-flight flag on every exit path, including a dropped future.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SelectionInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
