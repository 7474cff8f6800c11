//! Adaptive recency cache with ghost entries and self-tuning capacity.
//!
//! A bounded key → `Arc<V>` store built on a single recency list. The list is
//! split by a `boundary` cursor into a **live** region near the head (entries
//! that still own their payload) and a **ghost** tail (entries whose payload
//! was released but whose key is remembered). Ghosts let a lookup tell a
//! recent eviction (near miss) apart from a key the cache never held or has
//! long forgotten (far miss). Those counts drive [`AdaptiveCache::adjust_size`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                     AdaptiveCache<K, V> Layout                           │
//! │                                                                          │
//! │   index: FxHashMap<K, SlotId>     list: IntrusiveList<Entry<K, V>>       │
//! │                                                                          │
//! │   head                                  boundary                 tail    │
//! │    │                                       │                      │      │
//! │    ▼                                       ▼                      ▼      │
//! │   [9:V] ◄─► [8:V] ◄─► [7:V] ◄─► [6:V] ◄─► [5:·] ◄─► [4:·] ◄─► [3:·]      │
//! │   └──────────── live (payload) ──────────┘└──── ghost (key only) ───┘    │
//! │                                                                          │
//! │   live_len <= max_live            ghost_len <= max_ghost                 │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation        | Effect                                               |
//! |------------------|------------------------------------------------------|
//! | `lookup`         | hit / near miss promote to head; far miss counts only |
//! | `insert`         | replace any old entry, push live at head, trim       |
//! | `trim`           | demote oldest live to ghost, destroy oldest ghosts   |
//! | `recommend_size` | classify window stats, then reset them               |
//! | `adjust_size`    | apply recommendation to `max_frames`                 |
//!
//! A near-miss lookup moves the tombstone to the head without a payload.
//! Such an entry still counts as a ghost; when trimming later walks the
//! boundary over it, it is absorbed into the ghost tail without touching
//! the counters.
//!
//! ## Resize policy
//!
//! ```text
//!   total = hits + near + far
//!   total == 0          → Clear
//!   total <  30         → NoChange
//!   near * 20 >= total  → Grow     (≥5% near misses)
//!   near == 0 && hits == 0 → Shrink (pure scan)
//!   otherwise           → NoChange
//! ```
//!
//! ## Thread Safety
//!
//! - [`AdaptiveCache`]: single-threaded; every lookup mutates recency order,
//!   so even reads need `&mut self`.
//! - [`ConcurrentAdaptiveCache`]: `Arc<Mutex<_>>` wrapper. One exclusive lock
//!   covers index, list, boundary and counters.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use framecache::policy::adaptive::{AdaptiveCache, Lookup};
//!
//! let mut cache: AdaptiveCache<u32, String> = AdaptiveCache::new(2, 4, false);
//! cache.insert(1, Arc::new("one".into()));
//! cache.insert(2, Arc::new("two".into()));
//! cache.insert(3, Arc::new("three".into()));
//!
//! // frame 1 was demoted to a ghost
//! assert!(matches!(cache.lookup(&1), Lookup::NearMiss));
//! assert!(matches!(cache.lookup(&3), Lookup::Hit(_)));
//! assert!(matches!(cache.lookup(&42), Lookup::FarMiss));
//! ```

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ds::{IntrusiveList, SlotId};
use crate::traits::{ConcurrentCache, ResizableCache};

/// Minimum number of lookups in a window before the policy acts.
pub const MIN_SAMPLE_SIZE: u64 = 30;

/// Grow when `near_misses * NEAR_MISS_GROW_RATIO >= total` (5%).
pub const NEAR_MISS_GROW_RATIO: u64 = 20;

/// Frames added by a `Grow` decision.
const GROW_STEP: usize = 2;

/// Outcome of [`AdaptiveCache::lookup`].
pub enum Lookup<V> {
    /// Payload present; the caller receives a new shared owner.
    Hit(Arc<V>),
    /// Key remembered as a ghost; payload already released.
    NearMiss,
    /// Key unknown.
    FarMiss,
}

impl<V> Lookup<V> {
    /// Returns the payload on a hit.
    #[inline]
    pub fn into_hit(self) -> Option<Arc<V>> {
        match self {
            Lookup::Hit(payload) => Some(payload),
            Lookup::NearMiss | Lookup::FarMiss => None,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    #[inline]
    pub fn is_near_miss(&self) -> bool {
        matches!(self, Lookup::NearMiss)
    }

    #[inline]
    pub fn is_far_miss(&self) -> bool {
        matches!(self, Lookup::FarMiss)
    }
}

impl<V> Debug for Lookup<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Hit(_) => f.write_str("Hit"),
            Lookup::NearMiss => f.write_str("NearMiss"),
            Lookup::FarMiss => f.write_str("FarMiss"),
        }
    }
}

/// Resize decision produced by [`AdaptiveCache::recommend_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheAction {
    /// No traffic since the last evaluation; drop everything.
    Clear,
    /// Enough near misses that a slightly larger cache would catch them.
    Grow,
    /// Every access was a far miss; contents are not being reused.
    Shrink,
    /// Keep the current size.
    NoChange,
}

/// Lookup counters accumulated since the last policy evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub near_misses: u64,
    pub far_misses: u64,
}

impl LookupStats {
    /// Total lookups in the window.
    #[inline]
    pub fn total(&self) -> u64 {
        self.hits + self.near_misses + self.far_misses
    }

    /// Classifies the window. Grow is checked before shrink.
    pub fn recommend(&self) -> CacheAction {
        let total = self.total();
        if total == 0 {
            return CacheAction::Clear;
        }
        if total < MIN_SAMPLE_SIZE {
            return CacheAction::NoChange;
        }

        let grow = self.near_misses * NEAR_MISS_GROW_RATIO >= total;
        let shrink = self.near_misses == 0 && self.hits == 0;

        if grow {
            CacheAction::Grow
        } else if shrink {
            CacheAction::Shrink
        } else {
            CacheAction::NoChange
        }
    }
}

/// Lifetime counters for an [`AdaptiveCache`]; never reset by the policy.
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct AdaptiveMetrics {
    /// Lookups that returned a payload.
    pub hits: u64,
    /// Lookups that found a ghost.
    pub near_misses: u64,
    /// Lookups that found nothing.
    pub far_misses: u64,
    /// Calls to `insert`.
    pub inserts: u64,
    /// Live entries turned into ghosts by trimming.
    pub demotions: u64,
    /// Ghost entries destroyed by trimming.
    pub ghost_evictions: u64,
    /// `adjust_size` decisions, by action.
    pub clears: u64,
    pub grows: u64,
    pub shrinks: u64,
}

#[cfg(feature = "metrics")]
impl fmt::Display for AdaptiveMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.hits + self.near_misses + self.far_misses;
        let hit_rate = if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        write!(
            f,
            "AdaptiveMetrics {{ hits: {}, near_misses: {}, far_misses: {}, hit_rate: {:.2}%, \
             inserts: {}, demotions: {}, ghost_evictions: {}, clears: {}, grows: {}, shrinks: {} }}",
            self.hits,
            self.near_misses,
            self.far_misses,
            hit_rate,
            self.inserts,
            self.demotions,
            self.ghost_evictions,
            self.clears,
            self.grows,
            self.shrinks
        )
    }
}

/// List node payload. `payload == None` marks a ghost.
struct Entry<K, V> {
    key: K,
    payload: Option<Arc<V>>,
}

// ---------------------------------------------------------------------------
// AdaptiveCache
// ---------------------------------------------------------------------------

/// Recency cache with a ghost tail and a statistics-driven resize policy.
///
/// # Type Parameters
///
/// - `K`: Key type (a frame index in the scheduler), `Copy + Eq + Hash`
/// - `V`: Payload type, stored as `Arc<V>` so evicted payloads stay valid
///   for whoever still holds them
pub struct AdaptiveCache<K, V> {
    list: IntrusiveList<Entry<K, V>>,
    index: FxHashMap<K, SlotId>,

    /// Most recent entry of the contiguous ghost tail. `None` until the
    /// first demotion, or after the whole tail was destroyed.
    boundary: Option<SlotId>,

    live_len: usize,
    ghost_len: usize,

    max_live: usize,
    max_ghost: usize,
    fixed_size: bool,

    stats: LookupStats,

    #[cfg(feature = "metrics")]
    metrics: AdaptiveMetrics,
}

impl<K, V> AdaptiveCache<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Creates a cache holding at most `max_frames` payloads and remembering
    /// at most `max_history` ghost keys. `fixed_size` disables
    /// [`adjust_size`](Self::adjust_size).
    pub fn new(max_frames: usize, max_history: usize, fixed_size: bool) -> Self {
        let reserve = max_frames.saturating_add(max_history);
        Self {
            list: IntrusiveList::with_capacity(reserve),
            index: FxHashMap::with_capacity_and_hasher(reserve, Default::default()),
            boundary: None,
            live_len: 0,
            ghost_len: 0,
            max_live: max_frames,
            max_ghost: max_history,
            fixed_size,
            stats: LookupStats::default(),
            #[cfg(feature = "metrics")]
            metrics: AdaptiveMetrics::default(),
        }
    }

    /// Total entries, live and ghost.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Entries that still own a payload.
    #[inline]
    pub fn live_len(&self) -> usize {
        self.live_len
    }

    /// Entries remembered without a payload.
    #[inline]
    pub fn ghost_len(&self) -> usize {
        self.ghost_len
    }

    /// Returns `true` if `key` is tracked, live or ghost.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns `true` if `key` is tracked and still owns its payload.
    pub fn is_live(&self, key: &K) -> bool {
        self.index
            .get(key)
            .and_then(|&id| self.list.get(id))
            .is_some_and(|entry| entry.payload.is_some())
    }

    #[inline]
    pub fn max_frames(&self) -> usize {
        self.max_live
    }

    #[inline]
    pub fn max_history(&self) -> usize {
        self.max_ghost
    }

    #[inline]
    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size
    }

    /// Sets the live capacity and trims to it.
    pub fn set_max_frames(&mut self, max_frames: usize) {
        self.max_live = max_frames;
        self.trim(self.max_live, self.max_ghost);
    }

    /// Sets the ghost capacity and trims to it.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_ghost = max_history;
        self.trim(self.max_live, self.max_ghost);
    }

    /// Counters accumulated since the last [`recommend_size`](Self::recommend_size).
    #[inline]
    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    #[cfg(feature = "metrics")]
    #[inline]
    pub fn metrics(&self) -> &AdaptiveMetrics {
        &self.metrics
    }

    #[cfg(feature = "metrics")]
    #[inline]
    pub fn reset_metrics(&mut self) {
        self.metrics = AdaptiveMetrics::default();
    }

    /// Classifies `key` as hit, near miss or far miss and records it.
    ///
    /// Hits and near misses promote the entry to the head.
    pub fn lookup(&mut self, key: &K) -> Lookup<V> {
        let Some(&id) = self.index.get(key) else {
            self.stats.far_misses += 1;
            #[cfg(feature = "metrics")]
            {
                self.metrics.far_misses += 1;
            }
            return Lookup::FarMiss;
        };

        let payload = self.list.get(id).and_then(|entry| entry.payload.clone());
        self.promote(id);

        match payload {
            Some(payload) => {
                self.stats.hits += 1;
                #[cfg(feature = "metrics")]
                {
                    self.metrics.hits += 1;
                }
                Lookup::Hit(payload)
            },
            None => {
                self.stats.near_misses += 1;
                #[cfg(feature = "metrics")]
                {
                    self.metrics.near_misses += 1;
                }
                Lookup::NearMiss
            },
        }
    }

    /// Shorthand for [`lookup`](Self::lookup) that only keeps the payload.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        self.lookup(key).into_hit()
    }

    /// Returns the payload without promoting or counting.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let &id = self.index.get(key)?;
        self.list.get(id)?.payload.clone()
    }

    /// Inserts `payload` under `key` at the head, replacing any previous
    /// entry for the key, then trims to the configured capacities.
    pub fn insert(&mut self, key: K, payload: Arc<V>) {
        self.remove(&key);

        let id = self.list.push_front(Entry {
            key,
            payload: Some(payload),
        });
        self.index.insert(key, id);
        self.live_len += 1;

        #[cfg(feature = "metrics")]
        {
            self.metrics.inserts += 1;
        }

        self.trim(self.max_live, self.max_ghost);
    }

    /// Destroys the entry for `key`, live or ghost. Returns whether it existed.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&id) => {
                self.unlink(id);
                true
            },
            None => false,
        }
    }

    /// Destroys every entry and resets counters; capacities are kept.
    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
        self.boundary = None;
        self.live_len = 0;
        self.ghost_len = 0;
        self.stats = LookupStats::default();
    }

    /// Demotes least recent live entries until `live_len <= max_live`, then
    /// destroys oldest ghosts until `ghost_len <= max_ghost`.
    ///
    /// Both bounds are clamped to the configured capacities, so a looser
    /// explicit trim still leaves the cache within them.
    pub fn trim(&mut self, max_live: usize, max_ghost: usize) {
        let max_live = max_live.min(self.max_live);
        let max_ghost = max_ghost.min(self.max_ghost);

        while self.live_len > max_live {
            if !self.advance_boundary() {
                break;
            }
        }

        while self.ghost_len > max_ghost {
            let Some(id) = self.oldest_ghost() else {
                break;
            };
            self.unlink(id);
            #[cfg(feature = "metrics")]
            {
                self.metrics.ghost_evictions += 1;
            }
        }
    }

    /// Evaluates the window counters and resets them.
    pub fn recommend_size(&mut self) -> CacheAction {
        let stats = std::mem::take(&mut self.stats);
        let action = stats.recommend();
        debug!(
            ?action,
            total = stats.total(),
            far_misses = stats.far_misses,
            near_misses = stats.near_misses,
            hits = stats.hits,
            max_frames = self.max_live,
            "cache resize recommendation"
        );
        action
    }

    /// Applies [`recommend_size`](Self::recommend_size) to `max_frames`.
    ///
    /// Under `need_memory` the cache never grows, shrinks faster, and a
    /// `NoChange` still sheds one frame (floor of one, clearing first when
    /// already at the floor). Returns `None` for fixed-size caches.
    ///
    /// ```
    /// use framecache::policy::adaptive::{AdaptiveCache, CacheAction};
    ///
    /// let mut cache: AdaptiveCache<u32, ()> = AdaptiveCache::new(10, 10, false);
    /// for k in 0..30 {
    ///     cache.lookup(&k);
    /// }
    /// assert_eq!(cache.adjust_size(true), Some(CacheAction::Shrink));
    /// assert_eq!(cache.max_frames(), 8);
    /// ```
    pub fn adjust_size(&mut self, need_memory: bool) -> Option<CacheAction> {
        if self.fixed_size {
            return None;
        }

        let action = self.recommend_size();
        let frames = self.max_live;

        match (action, need_memory) {
            (CacheAction::Clear, _) => {
                self.clear();
                self.set_max_frames(frames.saturating_sub(2));
            },
            (CacheAction::Grow, false) => self.set_max_frames(frames + GROW_STEP),
            (CacheAction::Grow, true) => {},
            (CacheAction::Shrink, false) => self.set_max_frames(frames.saturating_sub(1)),
            (CacheAction::Shrink, true) => self.set_max_frames(frames.saturating_sub(2)),
            (CacheAction::NoChange, false) => {},
            (CacheAction::NoChange, true) => {
                if frames <= 1 {
                    self.clear();
                }
                // floor of one slot, but never raise a cache already at zero
                self.set_max_frames(frames.saturating_sub(1).max(1).min(frames));
            },
        }

        #[cfg(feature = "metrics")]
        match action {
            CacheAction::Clear => self.metrics.clears += 1,
            CacheAction::Grow if !need_memory => self.metrics.grows += 1,
            CacheAction::Shrink => self.metrics.shrinks += 1,
            _ => {},
        }

        if self.max_live != frames {
            debug!(from = frames, to = self.max_live, need_memory, "cache resized");
        }

        Some(action)
    }

    /// Keys from most to least recently used, ghosts included.
    pub fn keys_mru(&self) -> Vec<K> {
        self.list.iter().map(|entry| entry.key).collect()
    }

    // -----------------------------------------------------------------------
    // List helpers
    // -----------------------------------------------------------------------

    fn promote(&mut self, id: SlotId) {
        if self.list.front_id() == Some(id) {
            return;
        }
        if self.boundary == Some(id) {
            self.boundary = self.list.next_id(id);
        }
        self.list.move_to_front(id);
    }

    /// Moves the boundary one entry toward the head, releasing the payload
    /// of the entry it crosses. Returns `false` when nothing is left to cross.
    fn advance_boundary(&mut self) -> bool {
        let next = match self.boundary {
            None => self.list.back_id(),
            Some(boundary) => self.list.prev_id(boundary),
        };
        let Some(id) = next else {
            return false;
        };
        self.boundary = Some(id);

        if let Some(entry) = self.list.get_mut(id)
            && entry.payload.take().is_some()
        {
            self.live_len -= 1;
            self.ghost_len += 1;
            #[cfg(feature = "metrics")]
            {
                self.metrics.demotions += 1;
            }
        }
        true
    }

    /// Least recent payload-less entry; the tail in steady state.
    fn oldest_ghost(&self) -> Option<SlotId> {
        let mut current = self.list.back_id();
        while let Some(id) = current {
            if self.list.get(id).is_some_and(|entry| entry.payload.is_none()) {
                return Some(id);
            }
            current = self.list.prev_id(id);
        }
        None
    }

    fn unlink(&mut self, id: SlotId) {
        if self.boundary == Some(id) {
            self.boundary = self.list.next_id(id);
        }
        if let Some(entry) = self.list.remove(id) {
            self.index.remove(&entry.key);
            if entry.payload.is_some() {
                self.live_len -= 1;
            } else {
                self.ghost_len -= 1;
            }
        }
    }

    /// Validates internal invariants (debug-only).
    #[cfg(debug_assertions)]
    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantError>
    where
        K: Debug,
    {
        use crate::error::InvariantError;

        self.list.debug_validate_invariants();

        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index size {} != list size {}",
                self.index.len(),
                self.list.len()
            )));
        }

        let mut live = 0;
        let mut ghost = 0;
        let mut in_ghost_tail = false;
        for id in self.list.iter_ids() {
            let entry = self
                .list
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("stale SlotId {:?}", id)))?;
            if self.index.get(&entry.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "key {:?} not indexed at its list slot",
                    entry.key
                )));
            }
            if Some(id) == self.boundary {
                in_ghost_tail = true;
            }
            match &entry.payload {
                Some(_) if in_ghost_tail => {
                    return Err(InvariantError::new(format!(
                        "key {:?} behind the boundary still owns a payload",
                        entry.key
                    )));
                },
                Some(_) => live += 1,
                None => ghost += 1,
            }
        }

        if self.boundary.is_some() && !in_ghost_tail {
            return Err(InvariantError::new("boundary is not a list member"));
        }
        if live != self.live_len {
            return Err(InvariantError::new(format!(
                "counted {} live entries but live_len = {}",
                live, self.live_len
            )));
        }
        if ghost != self.ghost_len {
            return Err(InvariantError::new(format!(
                "counted {} ghost entries but ghost_len = {}",
                ghost, self.ghost_len
            )));
        }
        if self.live_len > self.max_live {
            return Err(InvariantError::new(format!(
                "live_len {} > max_frames {}",
                self.live_len, self.max_live
            )));
        }
        if self.ghost_len > self.max_ghost {
            return Err(InvariantError::new(format!(
                "ghost_len {} > max_history {}",
                self.ghost_len, self.max_ghost
            )));
        }

        Ok(())
    }
}

impl<K, V> Debug for AdaptiveCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCache")
            .field("live_len", &self.live_len)
            .field("ghost_len", &self.ghost_len)
            .field("max_frames", &self.max_live)
            .field("max_history", &self.max_ghost)
            .field("fixed_size", &self.fixed_size)
            .field("stats", &self.stats)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

/// Thread-safe [`AdaptiveCache`] behind a single exclusive lock.
///
/// Lookups reorder the recency list, so there is no shared-read path: every
/// call takes the `Mutex`. Clones share the same cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use framecache::policy::adaptive::ConcurrentAdaptiveCache;
///
/// let cache = ConcurrentAdaptiveCache::new(20, 20, false);
/// cache.insert(7u32, Arc::new(vec![0u8; 16]));
///
/// let other = cache.clone();
/// assert!(other.get(&7).is_some());
/// ```
pub struct ConcurrentAdaptiveCache<K, V> {
    inner: Arc<Mutex<AdaptiveCache<K, V>>>,
}

impl<K, V> Clone for ConcurrentAdaptiveCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Debug for ConcurrentAdaptiveCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConcurrentAdaptiveCache")
            .field(&*self.inner.lock())
            .finish()
    }
}

impl<K, V> ConcurrentAdaptiveCache<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Creates a new shared cache. See [`AdaptiveCache::new`].
    pub fn new(max_frames: usize, max_history: usize, fixed_size: bool) -> Self {
        Self::from_cache(AdaptiveCache::new(max_frames, max_history, fixed_size))
    }

    /// Wraps an existing cache.
    pub fn from_cache(cache: AdaptiveCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `f` with the lock held, for multi-step updates that must not
    /// interleave with other threads.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut AdaptiveCache<K, V>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn lookup(&self, key: &K) -> Lookup<V> {
        self.inner.lock().lookup(key)
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().get(key)
    }

    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().peek(key)
    }

    pub fn insert(&self, key: K, payload: Arc<V>) {
        self.inner.lock().insert(key, payload);
    }

    pub fn remove(&self, key: &K) -> bool {
        self.inner.lock().remove(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn trim(&self, max_live: usize, max_ghost: usize) {
        self.inner.lock().trim(max_live, max_ghost);
    }

    pub fn recommend_size(&self) -> CacheAction {
        self.inner.lock().recommend_size()
    }

    pub fn adjust_size(&self, need_memory: bool) -> Option<CacheAction> {
        self.inner.lock().adjust_size(need_memory)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn live_len(&self) -> usize {
        self.inner.lock().live_len()
    }

    pub fn ghost_len(&self) -> usize {
        self.inner.lock().ghost_len()
    }

    pub fn max_frames(&self) -> usize {
        self.inner.lock().max_frames()
    }

    pub fn set_max_frames(&self, max_frames: usize) {
        self.inner.lock().set_max_frames(max_frames);
    }

    pub fn max_history(&self) -> usize {
        self.inner.lock().max_history()
    }

    pub fn set_max_history(&self, max_history: usize) {
        self.inner.lock().set_max_history(max_history);
    }

    pub fn is_fixed_size(&self) -> bool {
        self.inner.lock().is_fixed_size()
    }

    pub fn stats(&self) -> LookupStats {
        self.inner.lock().stats()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> AdaptiveMetrics {
        self.inner.lock().metrics().clone()
    }

    /// Weak, type-erased handle used by [`CacheManager`](crate::manager::CacheManager).
    pub fn resize_handle(&self) -> Weak<dyn ResizableCache>
    where
        K: Send + 'static,
        V: Send + Sync + 'static,
    {
        let weak: Weak<Mutex<AdaptiveCache<K, V>>> = Arc::downgrade(&self.inner);
        weak
    }
}

impl<K, V> ResizableCache for Mutex<AdaptiveCache<K, V>>
where
    K: Copy + Eq + Hash + Send,
    V: Send + Sync,
{
    fn adjust_size(&self, need_memory: bool) -> Option<CacheAction> {
        self.lock().adjust_size(need_memory)
    }

    fn max_frames(&self) -> usize {
        self.lock().max_frames()
    }
}

impl<K, V> ConcurrentCache for ConcurrentAdaptiveCache<K, V>
where
    K: Send,
    V: Send + Sync,
{
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
