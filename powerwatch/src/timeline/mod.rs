//! The power state timeline.
//!
//! Raw reachability results flow through [`ReachabilityTracker`], which
//! turns poll failures into held or forced samples, and then into the
//! [`DebounceStateMachine`], which commits stable state changes. Every
//! commit or rollover closes the open interval into the [`SegmentLog`].
//!
//! ```text
//!  poll result ──► ReachabilityTracker ──► DebounceStateMachine ──► Commit
//!                   (grace period)          (debounce window)        │
//!                                                                    ├─► SegmentLog
//!                                                                    └─► StateChanged
//! ```

mod config;
mod debounce;
mod reachability;
mod segment_log;
pub(crate) mod seconds;

pub use config::TimelineConfig;
pub use debounce::{Commit, CurrentState, DebounceStateMachine, PendingTransition, StateChanged};
pub use reachability::{EffectiveSample, ReachabilityState, ReachabilityTracker};
pub use segment_log::{LogEntry, SegmentLog, StateTotals};

/// Unix time in whole seconds.
pub type Timestamp = i64;

pub(crate) const SECONDS_PER_DAY: i64 = 86_400;
