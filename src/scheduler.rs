//! Two-phase frame request scheduler with linearizing prefetch.
//!
//! A [`FrameScheduler`] sits between a downstream consumer and an upstream
//! [`FrameSource`], in front of a shared [`ConcurrentAdaptiveCache`]. The
//! host drives each request through two phases:
//!
//! ```text
//!   initial(n) ──► cache hit? ──yes──► Activation::Ready(frame)
//!       │
//!       no
//!       ▼
//!   small forward gap? ──yes──► request last+1 ..= n   (batch)
//!       │
//!       no ─────────────────► request n                (single)
//!       ▼
//!   Activation::Pending(PendingFrame)
//!       │   ... host waits until every requested frame is ready ...
//!       ▼
//!   ready(pending) ──► cache prefetched frames, cache n, return n
//! ```
//!
//! Worker threads pull frames slightly out of order, bounded by the thread
//! count. When a request lands a little ahead of the previous one the
//! skipped frames will almost certainly be asked for next, so they are
//! fetched in the same round trip. Jumps past
//! `worker_count + EXTRA_FRAMES` are treated as seeks and fetched alone.
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use framecache::policy::adaptive::ConcurrentAdaptiveCache;
//! use framecache::scheduler::{Activation, FrameScheduler, SchedulerConfig};
//! use framecache::traits::{FrameIndex, FrameSource};
//!
//! struct Counter;
//!
//! impl FrameSource for Counter {
//!     type Frame = FrameIndex;
//!     type Error = Infallible;
//!     fn request_frame(&self, _n: FrameIndex) {}
//!     fn frame(&self, n: FrameIndex) -> Result<Arc<FrameIndex>, Infallible> {
//!         Ok(Arc::new(n))
//!     }
//! }
//!
//! let cache = ConcurrentAdaptiveCache::new(40, 20, false);
//! let scheduler = FrameScheduler::new(Counter, cache, SchedulerConfig::new(true, 4));
//!
//! scheduler.get_frame(10).unwrap();
//! let Activation::Pending(pending) = scheduler.initial(13) else { unreachable!() };
//! assert_eq!(pending.requested(), 11..=13);
//! assert_eq!(*scheduler.ready(pending).unwrap(), 13);
//!
//! // 11 and 12 were cached on the way
//! assert!(matches!(scheduler.initial(12), Activation::Ready(_)));
//! ```

use std::fmt::{self, Debug};
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::policy::adaptive::ConcurrentAdaptiveCache;
use crate::traits::{FrameIndex, FrameSource};

/// Frames beyond the worker count that still count as catch-up rather than
/// a seek. Covers out-of-order pulls from filters with a wider temporal radius.
pub const EXTRA_FRAMES: u32 = 7;

/// Scheduler knobs for one cache node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    linearize: bool,
    worker_count: u32,
}

impl SchedulerConfig {
    /// # Panics
    ///
    /// Panics if `worker_count` is zero. See [`try_new`](Self::try_new).
    pub fn new(linearize: bool, worker_count: u32) -> Self {
        match Self::try_new(linearize, worker_count) {
            Ok(config) => config,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if `worker_count` is zero.
    pub fn try_new(linearize: bool, worker_count: u32) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::new("worker_count must be greater than zero"));
        }
        Ok(Self {
            linearize,
            worker_count,
        })
    }

    #[inline]
    pub fn linearize(&self) -> bool {
        self.linearize
    }

    #[inline]
    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }

    /// Width of the catch-up window past the previous request.
    #[inline]
    pub fn lookahead(&self) -> u32 {
        self.worker_count.saturating_add(EXTRA_FRAMES)
    }
}

/// State carried from the initial phase to the ready phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFrame {
    frame: FrameIndex,
    /// Frames requested ahead of `frame`; empty when not batched.
    prefetch: Range<FrameIndex>,
}

impl PendingFrame {
    /// The frame this activation must return.
    #[inline]
    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    /// Speculatively requested frames, cached by the ready phase.
    #[inline]
    pub fn prefetch(&self) -> Range<FrameIndex> {
        self.prefetch.clone()
    }

    #[inline]
    pub fn is_batch(&self) -> bool {
        !self.prefetch.is_empty()
    }

    /// Index requested immediately before the batch, `-1` meaning "before
    /// frame 0". `None` for single-frame requests.
    pub fn batch_marker(&self) -> Option<i64> {
        self.is_batch().then(|| i64::from(self.prefetch.start) - 1)
    }

    /// Every index issued upstream by the initial phase.
    pub fn requested(&self) -> RangeInclusive<FrameIndex> {
        if self.is_batch() {
            self.prefetch.start..=self.frame
        } else {
            self.frame..=self.frame
        }
    }
}

/// Result of the initial phase.
pub enum Activation<F> {
    /// Served from cache; nothing was requested.
    Ready(Arc<F>),
    /// Upstream requests were issued; call
    /// [`FrameScheduler::ready`] once they are available.
    Pending(PendingFrame),
}

impl<F> Activation<F> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Activation::Ready(_))
    }

    /// Returns the pending state, if the activation must be resumed.
    #[inline]
    pub fn pending(self) -> Option<PendingFrame> {
        match self {
            Activation::Pending(pending) => Some(pending),
            Activation::Ready(_) => None,
        }
    }
}

impl<F> Debug for Activation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Ready(_) => f.write_str("Ready"),
            Activation::Pending(pending) => f.debug_tuple("Pending").field(pending).finish(),
        }
    }
}

/// Per-node request controller. Shared by every worker thread of the host.
pub struct FrameScheduler<S: FrameSource> {
    source: S,
    cache: ConcurrentAdaptiveCache<FrameIndex, S::Frame>,
    config: SchedulerConfig,
    /// `None` until the first request, i.e. "before frame 0".
    last_requested: Mutex<Option<FrameIndex>>,
}

impl<S: FrameSource> FrameScheduler<S> {
    pub fn new(
        source: S,
        cache: ConcurrentAdaptiveCache<FrameIndex, S::Frame>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            source,
            cache,
            config,
            last_requested: Mutex::new(None),
        }
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub fn cache(&self) -> &ConcurrentAdaptiveCache<FrameIndex, S::Frame> {
        &self.cache
    }

    #[inline]
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn last_requested(&self) -> Option<FrameIndex> {
        *self.last_requested.lock()
    }

    /// Initial phase for frame `n`. Never blocks on upstream production.
    pub fn initial(&self, n: FrameIndex) -> Activation<S::Frame> {
        if let Some(frame) = self.cache.get(&n) {
            return Activation::Ready(frame);
        }

        let pending = self.plan(n);
        if pending.is_batch() {
            trace!(
                frame = n,
                from = pending.prefetch.start,
                "linearizing request into batch"
            );
        }
        for i in pending.requested() {
            self.source.request_frame(i);
        }
        Activation::Pending(pending)
    }

    /// Ready phase: caches prefetched frames and returns frame `n`.
    ///
    /// A prefetched frame that fails is skipped; the error for `n` itself
    /// is returned unchanged, after the prefetched frames were cached.
    pub fn ready(&self, pending: PendingFrame) -> Result<Arc<S::Frame>, S::Error> {
        let mut fetched = Vec::with_capacity(pending.prefetch.len());
        for i in pending.prefetch() {
            match self.source.frame(i) {
                Ok(frame) => fetched.push((i, frame)),
                Err(err) => debug!(frame = i, error = ?err, "prefetched frame not cached"),
            }
        }
        // prefetched frames are cached even if `n` itself fails
        if !fetched.is_empty() {
            self.cache.with_lock(|cache| {
                for (i, payload) in fetched {
                    cache.insert(i, payload);
                }
            });
        }

        let frame = self.source.frame(pending.frame)?;
        self.cache.insert(pending.frame, Arc::clone(&frame));
        Ok(frame)
    }

    /// Runs both phases back to back. Only valid for sources whose
    /// `frame` call succeeds right after `request_frame`.
    pub fn get_frame(&self, n: FrameIndex) -> Result<Arc<S::Frame>, S::Error> {
        match self.initial(n) {
            Activation::Ready(frame) => Ok(frame),
            Activation::Pending(pending) => self.ready(pending),
        }
    }

    /// Decides single vs batch and records `n` as the latest request.
    fn plan(&self, n: FrameIndex) -> PendingFrame {
        let prev = {
            let mut last = self.last_requested.lock();
            let prev = last.map_or(-1, i64::from);
            *last = Some(n);
            prev
        };

        let target = i64::from(n);
        let window_end = prev + i64::from(self.config.lookahead());
        let batch = self.config.linearize
            && target > prev
            && target < window_end
            && target != prev + 1;

        let start = if batch {
            FrameIndex::try_from(prev + 1).unwrap_or(n)
        } else {
            n
        };
        PendingFrame {
            frame: n,
            prefetch: start..n,
        }
    }
}

impl<S> Debug for FrameScheduler<S>
where
    S: FrameSource + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("last_requested", &self.last_requested())
            .finish()
    }
}
