//! # mb-handles
//!
//! Handle-based access to large files without loading them into memory.
//!
//! A caller opens a reference string (a `file://` URI or a path, or anything
//! a custom [`UriResolver`] understands) and receives an opaque
//! [`Handle`](mb_core::Handle). Bounded range reads are then issued against
//! the handle until the caller closes it.
//!
//! ## Quick start
//!
//! ```no_run
//! use mb_handles::HandleRegistry;
//!
//! let registry = HandleRegistry::default();
//! let handle = registry.open("file:///sdcard/DCIM/clip.mp4").unwrap();
//! let stat = registry.stat(handle).unwrap();
//! let head = registry.read_base64(handle, 0, 4096).unwrap();
//! println!("{} bytes, first chunk eof={}", stat.size, head.eof);
//! registry.close(handle);
//! ```

pub mod reader;
pub mod registry;
pub mod resolver;
pub mod scoped;

// Re-export key types at crate root for convenience.
pub use reader::{ByteRangeReader, RangeRead};
pub use registry::HandleRegistry;
pub use resolver::{FsResolver, MediaSource, ResolvedSource, UriResolver};
pub use scoped::ScopedHandle;
