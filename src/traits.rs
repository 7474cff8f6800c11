//! # Pipeline-facing traits
//!
//! The cache node talks to the rest of the pipeline through a small set of
//! traits, so the host engine (frame object model, activation runtime,
//! thread pool) stays out of this crate.
//!
//! ```text
//!   ┌──────────────────────┐   request_frame(n)   ┌─────────────────────────┐
//!   │   FrameScheduler<S>  │ ───────────────────► │ S: FrameSource          │
//!   │                      │ ◄─────────────────── │ (upstream pipeline node) │
//!   └──────────┬───────────┘   frame(n) -> Arc<F>  └─────────────────────────┘
//!              │
//!              ▼
//!   ┌──────────────────────┐   Weak<dyn ResizableCache>   ┌──────────────┐
//!   │ ConcurrentAdaptive   │ ◄─────────────────────────── │ CacheManager │
//!   │ Cache<FrameIndex, F> │        adjust_size()          └──────────────┘
//!   └──────────────────────┘
//! ```
//!
//! | Trait             | Purpose                                           |
//! |-------------------|---------------------------------------------------|
//! | `FrameSource`     | Upstream node: non-blocking request, then fetch   |
//! | `ResizableCache`  | Type-erased resize hook driven by the manager     |
//! | `ConcurrentCache` | Marker for caches safe to share across threads    |

use std::sync::Arc;

use crate::policy::adaptive::CacheAction;

/// Index of a frame (or audio block) within a clip.
pub type FrameIndex = u32;

/// Upstream producer of frames.
///
/// Mirrors the host's two primitives: `request_frame` only enqueues
/// production and must not block; `frame` is called once the host reports
/// that every requested frame is ready.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::Arc;
/// use framecache::traits::{FrameIndex, FrameSource};
///
/// struct Counter;
///
/// impl FrameSource for Counter {
///     type Frame = FrameIndex;
///     type Error = Infallible;
///
///     fn request_frame(&self, _n: FrameIndex) {}
///
///     fn frame(&self, n: FrameIndex) -> Result<Arc<FrameIndex>, Infallible> {
///         Ok(Arc::new(n))
///     }
/// }
///
/// assert_eq!(*Counter.frame(3).unwrap(), 3);
/// ```
pub trait FrameSource {
    /// Frame payload; shared with the cache through `Arc`.
    type Frame;
    /// Production failure, forwarded unchanged to the caller.
    type Error: std::fmt::Debug;

    /// Enqueues production of frame `n`.
    fn request_frame(&self, n: FrameIndex);

    /// Returns frame `n`. Only valid after `n` was requested and reported ready.
    fn frame(&self, n: FrameIndex) -> Result<Arc<Self::Frame>, Self::Error>;
}

impl<S: FrameSource + ?Sized> FrameSource for Arc<S> {
    type Frame = S::Frame;
    type Error = S::Error;

    fn request_frame(&self, n: FrameIndex) {
        (**self).request_frame(n);
    }

    fn frame(&self, n: FrameIndex) -> Result<Arc<Self::Frame>, Self::Error> {
        (**self).frame(n)
    }
}

/// Resize hook for caches registered with a
/// [`CacheManager`](crate::manager::CacheManager).
pub trait ResizableCache: Send + Sync {
    /// Applies the cache's resize policy. `None` for fixed-size caches.
    fn adjust_size(&self, need_memory: bool) -> Option<CacheAction>;

    /// Current live capacity.
    fn max_frames(&self) -> usize;
}

/// Marker trait for caches that are safe to share across threads.
pub trait ConcurrentCache: Send + Sync {}
