use crate::model::note::ScoreReport;

/// Receiver of note judgments.
/// Implementations: ScoreBoard (normal play), CalibrationTracker (calibration).
pub trait JudgeSink {
    /// A note produced a rank.
    fn report(&mut self, report: ScoreReport);

    /// A note left its window without being scored.
    fn break_combo(&mut self);
}
