use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of JSON-RPC correlation ids.
///
/// Starts at 1 and never hands out the same value twice, even under
/// concurrent callers.
pub struct RequestIdCounter {
    counter: AtomicU64,
}

impl RequestIdCounter {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call will receive.
    pub fn peek(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for RequestIdCounter {
    fn default() -> Self {
        Self::new()
    }
}
