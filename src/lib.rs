//! framecache: adaptive frame cache and linearizing request scheduler for
//! pull-based media pipelines.
//!
//! - [`policy::adaptive`]: recency cache with a ghost tail whose hit and
//!   near-miss statistics drive its own capacity.
//! - [`scheduler`]: two-phase request protocol that turns slightly
//!   out-of-order worker requests into sequential upstream batches.
//! - [`manager`]: node construction, instance naming and periodic resizing.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;
pub mod error;
pub mod manager;
pub mod policy;
pub mod prelude;
pub mod scheduler;
pub mod traits;
