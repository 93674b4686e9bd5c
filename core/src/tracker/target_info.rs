//! Per-target damage accumulation with a sliding recency window.

use hashbrown::HashSet;
use uuid::Uuid;

use super::event::DamageEvent;

/// Span of the sliding window used for target-selection comparisons.
pub const RECENT_WINDOW_MS: i64 = 20_000;
/// A target whose last hit is older than this contributes zero recent damage.
pub const RECENT_CUTOFF_MS: i64 = 10_000;

/// Everything tracked about one damage target.
#[derive(Debug, Default)]
pub struct TargetInfo {
    pub total_damage: i64,
    pub first_hit_ms: i64,
    pub last_hit_ms: i64,
    window: std::collections::VecDeque<(i64, i64)>,
    window_sum: i64,
    processed: HashSet<Uuid>,
}

impl TargetInfo {
    /// Fold one event in. Returns false if this uuid was already applied;
    /// the same hit must never count twice.
    pub fn apply(&mut self, event: &DamageEvent) -> bool {
        if !self.processed.insert(event.uuid) {
            return false;
        }
        let ts = event.timestamp_ms;
        self.total_damage += event.damage;
        if self.first_hit_ms == 0 || ts < self.first_hit_ms {
            self.first_hit_ms = ts;
        }
        if ts > self.last_hit_ms {
            self.last_hit_ms = ts;
        }
        self.window.push_back((ts, event.damage));
        self.window_sum += event.damage;
        let horizon = ts - RECENT_WINDOW_MS;
        while let Some(&(old_ts, old_dmg)) = self.window.front() {
            if old_ts >= horizon {
                break;
            }
            self.window.pop_front();
            self.window_sum -= old_dmg;
        }
        true
    }

    /// Windowed damage used to rank targets. Zero once the target has been
    /// quiet longer than the cutoff, so dead fights lose the comparison.
    pub fn recent_damage(&self, now_ms: i64) -> i64 {
        if now_ms - self.last_hit_ms > RECENT_CUTOFF_MS {
            0
        } else {
            self.window_sum
        }
    }

    /// Fight duration in ms, floored at 1 so rate math never divides by zero.
    pub fn battle_time_ms(&self) -> i64 {
        (self.last_hit_ms - self.first_hit_ms).max(1)
    }
}
