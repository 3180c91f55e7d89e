use crate::model::note::ScoreReport;
use crate::traits::judge_sink::JudgeSink;

/// Accumulates press offsets while calibrating.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationTracker {
    total_delta_ms: i64,
    count: u32,
}

impl CalibrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, delta_ms: i64) {
        self.total_delta_ms += delta_ms;
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean offset in milliseconds, or 0 with no samples.
    pub fn average_delta_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_delta_ms as f64 / self.count as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl JudgeSink for CalibrationTracker {
    fn report(&mut self, report: ScoreReport) {
        if let Some(delta) = report.delta_ms {
            self.record(delta);
        }
    }

    fn break_combo(&mut self) {}
}
