pub use crate::ds::{IntrusiveList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::manager::{CacheManager, CacheNode, CacheOptions, MediaKind};
#[cfg(feature = "metrics")]
pub use crate::policy::adaptive::AdaptiveMetrics;
pub use crate::policy::adaptive::{
    AdaptiveCache, CacheAction, ConcurrentAdaptiveCache, Lookup, LookupStats,
};
pub use crate::scheduler::{Activation, FrameScheduler, PendingFrame, SchedulerConfig};
pub use crate::traits::{ConcurrentCache, FrameIndex, FrameSource, ResizableCache};
