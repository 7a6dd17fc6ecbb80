//! # mb-picker
//!
//! Media selection: a [`MediaPicker`] backend trait for platform UI flows,
//! the single-flight [`MediaSelector`] that normalizes their results into
//! [`SelectionResult`](mb_core::SelectionResult)s, and [`PathListPicker`],
//! a backend over local paths.

pub mod path_list;
pub mod picker;
pub mod selector;

pub use path_list::PathListPicker;
pub use picker::{MediaPicker, PickOutcome};
pub use selector::MediaSelector;
