//! Judge windows, rank thresholds and combo scaling.

use serde::{Deserialize, Serialize};

/// Lead-in before a note's start time during which it is visible (ms).
pub const RENDER_LEAD_MS: u64 = 3000;

/// Tolerance around a note's start time (ms). A single note stays
/// judgeable until `start + SCORE_DELTA_MS`.
pub const SCORE_DELTA_MS: u64 = 500;

/// Combo count per step of the combo multiplier.
pub const COMBO_STEP: u32 = 5;

/// Ceiling of the combo multiplier.
pub const COMBO_MAX_MULTIPLIER: f64 = 5.0;

/// Minimum rank for a Perfect.
pub const PERFECT_RANK: f64 = 85.0;

/// Minimum rank that keeps the combo alive.
pub const GOOD_RANK: f64 = 60.0;

/// Minimum rank for a Fair.
pub const FAIR_RANK: f64 = 35.0;

/// Stick deflection below this magnitude counts as released.
pub const HOLD_DEAD_ZONE: f32 = 0.3;

/// Sustained note multiplier per millisecond of duration.
pub const SUSTAIN_MULTIPLIER_PER_MS: f64 = 0.007;

/// Bounds of the sustained note duration multiplier.
pub const SUSTAIN_MULTIPLIER_MIN: f64 = 2.0;
pub const SUSTAIN_MULTIPLIER_MAX: f64 = 4.0;

/// Classification of a single reported rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgment {
    Perfect,
    Good,
    Fair,
    Miss,
}

impl Judgment {
    /// Classify a 0-100 rank.
    pub fn from_rank(rank: f64) -> Self {
        if rank >= PERFECT_RANK {
            Judgment::Perfect
        } else if rank >= GOOD_RANK {
            Judgment::Good
        } else if rank >= FAIR_RANK {
            Judgment::Fair
        } else {
            Judgment::Miss
        }
    }

    /// Whether this judgment continues the combo.
    pub fn keeps_combo(self) -> bool {
        matches!(self, Judgment::Perfect | Judgment::Good)
    }

    pub fn label(self) -> &'static str {
        match self {
            Judgment::Perfect => "Perfect",
            Judgment::Good => "Good",
            Judgment::Fair => "Fair",
            Judgment::Miss => "Miss",
        }
    }
}

/// Score multiplier for the given combo count: `clamp(combo / 5, 1, 5)`.
pub fn combo_multiplier(combo: u32) -> f64 {
    (combo as f64 / COMBO_STEP as f64).clamp(1.0, COMBO_MAX_MULTIPLIER)
}

/// Score multiplier for a sustained note of the given duration.
pub fn sustain_multiplier(duration_ms: u64) -> f64 {
    (duration_ms as f64 * SUSTAIN_MULTIPLIER_PER_MS)
        .clamp(SUSTAIN_MULTIPLIER_MIN, SUSTAIN_MULTIPLIER_MAX)
}
