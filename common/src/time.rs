//! Wall clock and process-wide id generation

use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seeded from the clock so ids from separate runs do not collide.
static NEXT_ID: LazyLock<AtomicI64> = LazyLock::new(|| AtomicI64::new(unix_nanos_now()));

/// Current unix time in milliseconds.
#[must_use]
pub fn unix_millis_now() -> i64 {
    i64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(i64::MAX)
}

/// Next process-wide monotonic id for user orders and simulated trades.
#[must_use]
pub fn next_order_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed) + 1
}

fn unix_nanos_now() -> i64 {
    i64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
    )
    .unwrap_or(i64::MAX)
}
