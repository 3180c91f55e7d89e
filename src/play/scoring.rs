use crate::model::note::ScoreReport;
use crate::play::judge::{Judgment, combo_multiplier};
use crate::traits::judge_sink::JudgeSink;

/// The most recent judgment, kept for on-screen feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastJudgment {
    pub rank: f64,
    pub judgment: Judgment,
}

/// Score and combo tracker for one play-through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBoard {
    pub score: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub good_count: u32,
    pub fair_count: u32,
    last: Option<LastJudgment>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a judged rank. Perfect and Good extend the combo and are scaled by
    /// the combo multiplier; anything lower breaks the combo and a Miss scores
    /// nothing. `multiplier` is applied last.
    pub fn report_rank(&mut self, rank: f64, multiplier: f64) -> Judgment {
        let judgment = Judgment::from_rank(rank);
        let mut points = rank;
        match judgment {
            Judgment::Perfect => self.perfect_count += 1,
            Judgment::Good => self.good_count += 1,
            Judgment::Fair => self.fair_count += 1,
            Judgment::Miss => points = 0.0,
        }
        if judgment.keeps_combo() {
            self.combo += 1;
            points *= combo_multiplier(self.combo);
        } else {
            self.break_combo();
        }
        points *= multiplier;
        self.score += points.floor() as i64;
        self.last = Some(LastJudgment { rank, judgment });
        judgment
    }

    /// End the current combo.
    pub fn break_combo(&mut self) {
        self.max_combo = self.max_combo.max(self.combo);
        self.combo = 0;
    }

    /// Reset to the initial values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn last_judgment(&self) -> Option<LastJudgment> {
        self.last
    }

    /// Notes that reached Fair or better.
    pub fn judged_count(&self) -> u32 {
        self.perfect_count + self.good_count + self.fair_count
    }

    /// Notes in a chart of `total_notes` that did not reach Fair.
    pub fn miss_count(&self, total_notes: usize) -> u32 {
        (total_notes as u32).saturating_sub(self.judged_count())
    }

    /// Feedback text for the latest judgment, e.g. `Rank: 93\nPerfect`.
    pub fn last_judgment_text(&self) -> Option<String> {
        self.last
            .map(|l| format!("Rank: {:.0}\n{}", l.rank, l.judgment.label()))
    }

    /// Score and combo line for the in-play HUD.
    pub fn hud_text(&self) -> String {
        format!("Score: {}\nCombo: {}", self.score, self.combo)
    }

    /// Summary shown after a song finishes.
    pub fn ending_text(&self, total_notes: usize) -> String {
        format!(
            "Score: {}\nMaxCombo: {}\n\nPerfect: {}\nGood: {}\nFair: {}\nMiss: {}",
            self.score,
            self.max_combo.max(self.combo),
            self.perfect_count,
            self.good_count,
            self.fair_count,
            self.miss_count(total_notes)
        )
    }
}

impl JudgeSink for ScoreBoard {
    fn report(&mut self, report: ScoreReport) {
        self.report_rank(report.rank, report.multiplier);
    }

    fn break_combo(&mut self) {
        ScoreBoard::break_combo(self);
    }
}
