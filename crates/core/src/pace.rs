//! Central inter-call throttle for rate-limited providers.
//!
//! Sequential pipeline phases must leave a minimum gap between
//! successive external calls. Rather than scattering `sleep` calls
//! around the codebase, each call class shares a [`Pacer`] whose
//! interval is tuned in one place.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Gap between successive structured-content calls.
pub const CONTENT_CALL_INTERVAL: Duration = Duration::from_millis(500);

/// Gap between successive single-image generation calls.
pub const IMAGE_CALL_INTERVAL: Duration = Duration::from_millis(2000);

/// Gap between successive batch chunks of content requests.
pub const BATCH_CHUNK_INTERVAL: Duration = Duration::from_millis(3000);

/// Compute how long a caller must still wait, given the time elapsed
/// since the previous call. `None` elapsed means no previous call.
pub fn wait_needed(elapsed_since_last: Option<Duration>, min_interval: Duration) -> Duration {
    match elapsed_since_last {
        None => Duration::ZERO,
        Some(elapsed) => min_interval.saturating_sub(elapsed),
    }
}

/// Enforces a minimum interval between successive calls.
///
/// Shared via `Arc` by every call site of one call class. The first
/// call passes through immediately; each subsequent call sleeps until
/// the interval since the previous call has elapsed.
pub struct Pacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep until the configured interval since the previous call has
    /// passed, then mark this call as the new reference point.
    pub async fn pause(&self) {
        let wait = {
            let mut last = self.last_call.lock().expect("pacer lock poisoned");
            let now = Instant::now();
            let wait = wait_needed(last.map(|t| now.duration_since(t)), self.min_interval);
            // Reserve the slot before sleeping so concurrent callers
            // queue behind each other instead of stampeding.
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
