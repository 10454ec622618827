//! Constant variables.

use std::time::Duration;

/// Bit width of the ring key space. Also the finger table length.
/// Kept small so a whole ring fits in a demo; widen for production keys.
pub const KEY_BITS: u32 = 8;

/// Number of slots on the ring, `2^KEY_BITS`.
pub const RING_SIZE: u64 = 1 << KEY_BITS;

/// Size of the failover window kept beyond the immediate successor.
pub const SUCCESSOR_LIST_SIZE: usize = 2;

/// How long a freshly joined node refuses puts while the ring settles.
pub const JOIN_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Cadence of the maintenance cycle.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_millis(1000);

/// Per-probe budget for liveness pings. Short so one dead peer cannot
/// stall a whole maintenance cycle.
pub const PING_TIMEOUT: Duration = Duration::from_millis(300);

/// Overall deadline for one routed lookup, covering the full hop chain.
pub const LOOKUP_DEADLINE: Duration = Duration::from_secs(5);
