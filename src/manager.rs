//! Cache node construction and lifecycle-scoped resize driving.
//!
//! A [`CacheManager`] plays the role of the host core: it hands out
//! instance names, builds a [`FrameScheduler`] around a fresh
//! [`ConcurrentAdaptiveCache`] for each node and keeps a weak handle to every
//! cache so a periodic memory check can call [`CacheManager::adjust_all`].
//!
//! ## Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use framecache::manager::{CacheManager, CacheOptions, MediaKind};
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
//! let manager = CacheManager::new();
//! let options = CacheOptions::new().linearize(true);
//! let node = manager.create_node(Counter, MediaKind::Video, &options, 4).unwrap();
//!
//! assert_eq!(node.name(), "VideoCache1");
//! assert_eq!(node.scheduler().cache().max_frames(), 24);
//! assert_eq!(manager.registered(), 1);
//! ```

use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::info;

use crate::error::ConfigError;
use crate::policy::adaptive::ConcurrentAdaptiveCache;
use crate::scheduler::{EXTRA_FRAMES, FrameScheduler, SchedulerConfig};
use crate::traits::{FrameSource, ResizableCache};

/// Live capacity when no size is given and linearization is off.
pub const DEFAULT_MAX_FRAMES: usize = 20;

/// Ghost capacity unless overridden.
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Kind of media a cache node stores. Only affects naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn name_prefix(self) -> &'static str {
        match self {
            MediaKind::Video => "VideoCache",
            MediaKind::Audio => "AudioCache",
        }
    }
}

/// User-facing parameters of a cache node.
///
/// ```
/// use framecache::manager::CacheOptions;
///
/// let options = CacheOptions::new().size(0).linearize(true);
/// assert!(options.validate().is_ok());
/// // (8 workers + 7) * 2
/// assert_eq!(options.max_frames_for(8), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheOptions {
    size: Option<i64>,
    fixed: bool,
    linearize: bool,
    max_history: Option<usize>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live capacity override. Zero means "use the default".
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Disables adaptive resizing.
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Enables batching of out-of-order requests.
    pub fn linearize(mut self, linearize: bool) -> Self {
        self.linearize = linearize;
        self
    }

    pub fn max_history(mut self, max_history: usize) -> Self {
        self.max_history = Some(max_history);
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_linearize(&self) -> bool {
        self.linearize
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if `size` is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.size {
            Some(size) if size < 0 => Err(ConfigError::new(format!(
                "size must be >= 0, got {}",
                size
            ))),
            _ => Ok(()),
        }
    }

    /// Live capacity for a node served by `worker_count` threads.
    ///
    /// Linearized nodes must hold at least one full catch-up window, so
    /// the default scales with the thread count.
    pub fn max_frames_for(&self, worker_count: u32) -> usize {
        if let Some(size) = self.size
            && size > 0
        {
            return usize::try_from(size).unwrap_or(usize::MAX);
        }
        if self.linearize {
            let workers = usize::try_from(worker_count).unwrap_or(usize::MAX);
            let window = workers
                .saturating_add(EXTRA_FRAMES as usize)
                .saturating_mul(2);
            window.max(DEFAULT_MAX_FRAMES.saturating_add(workers))
        } else {
            DEFAULT_MAX_FRAMES
        }
    }

    pub fn max_history_or_default(&self) -> usize {
        self.max_history.unwrap_or(DEFAULT_MAX_HISTORY)
    }
}

/// A constructed cache node: its instance name and its scheduler.
pub struct CacheNode<S: FrameSource> {
    name: String,
    media: MediaKind,
    scheduler: FrameScheduler<S>,
}

impl<S: FrameSource> CacheNode<S> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn media(&self) -> MediaKind {
        self.media
    }

    #[inline]
    pub fn scheduler(&self) -> &FrameScheduler<S> {
        &self.scheduler
    }

    pub fn into_scheduler(self) -> FrameScheduler<S> {
        self.scheduler
    }
}

impl<S: FrameSource> fmt::Debug for CacheNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheNode")
            .field("name", &self.name)
            .field("media", &self.media)
            .field("config", &self.scheduler.config())
            .finish()
    }
}

/// Names cache nodes and drives resizing of every cache it created.
pub struct CacheManager {
    next_id: AtomicUsize,
    caches: Mutex<Vec<Weak<dyn ResizableCache>>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            caches: Mutex::new(Vec::new()),
        }
    }

    /// Builds a cache node in front of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a negative size or zero workers. No name
    /// is consumed on failure.
    pub fn create_node<S>(
        &self,
        source: S,
        media: MediaKind,
        options: &CacheOptions,
        worker_count: u32,
    ) -> Result<CacheNode<S>, ConfigError>
    where
        S: FrameSource,
        S::Frame: Send + Sync + 'static,
    {
        options.validate()?;
        let config = SchedulerConfig::try_new(options.linearize, worker_count)?;

        let max_frames = options.max_frames_for(worker_count);
        let max_history = options.max_history_or_default();
        let cache = ConcurrentAdaptiveCache::new(max_frames, max_history, options.fixed);
        self.register(cache.resize_handle());

        let name = self.next_name(media);
        info!(
            name = %name,
            max_frames,
            max_history,
            fixed = options.fixed,
            linearize = options.linearize,
            "created cache node"
        );

        Ok(CacheNode {
            name,
            media,
            scheduler: FrameScheduler::new(source, cache, config),
        })
    }

    /// Adds a cache to the resize registry, forgetting dropped ones.
    pub fn register(&self, cache: Weak<dyn ResizableCache>) {
        let mut caches = self.caches.lock();
        caches.retain(|weak| weak.strong_count() > 0);
        caches.push(cache);
    }

    /// Registry slots in use, dropped caches not yet pruned included.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.caches.lock().len()
    }

    /// Runs [`adjust_size`](ResizableCache::adjust_size) on every live cache
    /// and forgets dropped ones. Returns how many caches were visited.
    pub fn adjust_all(&self, need_memory: bool) -> usize {
        let live: Vec<_> = {
            let mut caches = self.caches.lock();
            caches.retain(|weak| weak.strong_count() > 0);
            caches.iter().filter_map(Weak::upgrade).collect()
        };
        for cache in &live {
            cache.adjust_size(need_memory);
        }
        live.len()
    }

    /// Number of registered caches still alive.
    pub fn registered(&self) -> usize {
        self.caches
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn next_name(&self, media: MediaKind) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", media.name_prefix(), id)
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("registered", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::adaptive::CacheAction;
    use std::convert::Infallible;
    use std::sync::Arc;

    struct Counter;

    impl FrameSource for Counter {
        type Frame = u32;
        type Error = Infallible;

        fn request_frame(&self, _n: u32) {}

        fn frame(&self, n: u32) -> Result<Arc<u32>, Infallible> {
            Ok(Arc::new(n))
        }
    }

    mod options {
        use super::*;

        #[test]
        fn negative_size_rejected() {
            let err = CacheOptions::new().size(-5).validate().unwrap_err();
            assert!(err.message().contains("-5"));
        }

        #[test]
        fn explicit_size_wins() {
            let options = CacheOptions::new().size(100).linearize(true);
            assert_eq!(options.max_frames_for(16), 100);
        }

        #[test]
        fn zero_size_uses_default() {
            assert_eq!(CacheOptions::new().size(0).max_frames_for(4), 20);
        }

        #[test]
        fn linearize_default_scales_with_workers() {
            let options = CacheOptions::new().linearize(true);
            // max(16, 21)
            assert_eq!(options.max_frames_for(1), 21);
            // max(30, 28)
            assert_eq!(options.max_frames_for(8), 30);
            // max(78, 52)
            assert_eq!(options.max_frames_for(32), 78);
        }

        #[test]
        fn huge_worker_count_saturates() {
            let options = CacheOptions::new().linearize(true);
            let frames = options.max_frames_for(u32::MAX);
            assert!(frames >= u32::MAX as usize);
        }

        #[test]
        fn history_default_and_override() {
            assert_eq!(CacheOptions::new().max_history_or_default(), 20);
            assert_eq!(
                CacheOptions::new().max_history(5).max_history_or_default(),
                5
            );
        }
    }

    mod naming {
        use super::*;

        #[test]
        fn names_increment_from_one_across_kinds() {
            let manager = CacheManager::new();
            let options = CacheOptions::new();
            let a = manager
                .create_node(Counter, MediaKind::Video, &options, 2)
                .unwrap();
            let b = manager
                .create_node(Counter, MediaKind::Audio, &options, 2)
                .unwrap();
            let c = manager
                .create_node(Counter, MediaKind::Video, &options, 2)
                .unwrap();
            assert_eq!(a.name(), "VideoCache1");
            assert_eq!(b.name(), "AudioCache2");
            assert_eq!(c.name(), "VideoCache3");
            assert_eq!(b.media(), MediaKind::Audio);
        }

        #[test]
        fn failed_creation_consumes_no_name() {
            let manager = CacheManager::new();
            let bad = CacheOptions::new().size(-1);
            assert!(manager
                .create_node(Counter, MediaKind::Video, &bad, 2)
                .is_err());
            assert!(manager
                .create_node(Counter, MediaKind::Video, &CacheOptions::new(), 0)
                .is_err());
            let node = manager
                .create_node(Counter, MediaKind::Video, &CacheOptions::new(), 2)
                .unwrap();
            assert_eq!(node.name(), "VideoCache1");
            assert_eq!(manager.registered(), 1);
        }
    }

    mod resizing {
        use super::*;

        #[test]
        fn register_prunes_dropped_caches() {
            let manager = CacheManager::new();
            for _ in 0..10 {
                let cache: ConcurrentAdaptiveCache<u32, u32> =
                    ConcurrentAdaptiveCache::new(4, 4, false);
                manager.register(cache.resize_handle());
            }
            // only the most recent handle survives each registration
            assert_eq!(manager.tracked(), 1);
            assert_eq!(manager.registered(), 0);
        }

        #[test]
        fn adjust_all_skips_dropped_caches() {
            let manager = CacheManager::new();
            let options = CacheOptions::new();
            let kept = manager
                .create_node(Counter, MediaKind::Video, &options, 2)
                .unwrap();
            let dropped = manager
                .create_node(Counter, MediaKind::Video, &options, 2)
                .unwrap();
            assert_eq!(manager.registered(), 2);

            drop(dropped);
            assert_eq!(manager.registered(), 1);
            // idle window: clear and give back two slots
            assert_eq!(manager.adjust_all(false), 1);
            assert_eq!(kept.scheduler().cache().max_frames(), 18);
        }

        #[test]
        fn adjust_all_under_pressure_shrinks() {
            let manager = CacheManager::new();
            let node = manager
                .create_node(Counter, MediaKind::Video, &CacheOptions::new().size(10), 1)
                .unwrap();
            let cache = node.scheduler().cache();
            for i in 100..140u32 {
                cache.get(&i);
            }
            manager.adjust_all(true);
            assert_eq!(cache.max_frames(), 8);
            assert_eq!(cache.stats().total(), 0);
        }

        #[test]
        fn fixed_caches_are_not_resized() {
            let manager = CacheManager::new();
            let options = CacheOptions::new().size(10).fixed(true);
            let node = manager
                .create_node(Counter, MediaKind::Video, &options, 1)
                .unwrap();
            manager.adjust_all(true);
            assert!(node.scheduler().cache().is_fixed_size());
            assert_eq!(node.scheduler().cache().max_frames(), 10);
        }

        #[test]
        fn registered_handle_drives_same_cache() {
            let manager = CacheManager::new();
            let cache: ConcurrentAdaptiveCache<u32, u32> = ConcurrentAdaptiveCache::new(8, 8, false);
            manager.register(cache.resize_handle());
            for i in 0..40u32 {
                cache.get(&i);
            }
            // 40 far misses, no hits
            assert_eq!(cache.stats().recommend(), CacheAction::Shrink);
            assert_eq!(manager.adjust_all(false), 1);
            assert_eq!(cache.max_frames(), 7);
        }
    }
}
