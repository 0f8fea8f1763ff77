use std::time::{Duration, Instant};

use glance_types::CaptureRegion;

/// Decides whether a fresh capture may be recognized without a double-tap
#[derive(Debug, Clone)]
pub struct InstantGate {
    cooldown: Duration,
    last_double_tap: Option<Instant>,
}

impl InstantGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_double_tap: None,
        }
    }

    pub fn record_double_tap(&mut self, at: Instant) {
        self.last_double_tap = Some(at);
    }

    /// False within the cooldown after the last double-tap
    pub fn allows(&self, now: Instant) -> bool {
        match self.last_double_tap {
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
            None => true,
        }
    }

    /// Small enough on at least one edge: `min_size * multiplier` or less
    pub fn qualifies(region: CaptureRegion, min_size: u32, multiplier: u32) -> bool {
        let limit = min_size.saturating_mul(multiplier);
        limit >= region.width || limit >= region.height
    }
}
