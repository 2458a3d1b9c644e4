use crate::game::judgment::{self, JudgeGrade};
use serde::Serialize;
use std::fmt;

/// Running session counters, updated synchronously by the judge and by the
/// kinematic pass (for timeout misses).
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a scoring-tier judgment. Misses go through `record_miss`.
    pub fn record_hit(&mut self, grade: JudgeGrade) {
        debug_assert!(grade != JudgeGrade::Miss, "misses are recorded separately");
        match grade {
            JudgeGrade::Perfect => self.perfect += 1,
            JudgeGrade::Great => self.great += 1,
            JudgeGrade::Good => self.good += 1,
            JudgeGrade::Miss => return,
        }
        self.score += judgment::grade_points_for(grade);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    /// Records a miss (by distance or by timeout) and breaks the combo.
    pub fn record_miss(&mut self) {
        self.miss += 1;
        self.combo = 0;
    }

    pub fn total_judged(&self) -> u32 {
        self.perfect + self.great + self.good + self.miss
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::F => "F",
        };
        write!(f, "{}", s)
    }
}

/// Step function over accuracy; boundaries are closed on the lower bound.
pub fn rank_for_accuracy(accuracy: u32) -> Rank {
    if accuracy >= 95 {
        Rank::S
    } else if accuracy >= 90 {
        Rank::A
    } else if accuracy >= 80 {
        Rank::B
    } else if accuracy >= 70 {
        Rank::C
    } else if accuracy >= 60 {
        Rank::D
    } else {
        Rank::F
    }
}

/// Final session tuple handed to the evaluation collaborator.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Evaluation {
    pub score: u64,
    pub max_combo: u32,
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
    pub total: u32,
    pub accuracy: u32,
    pub rank: Rank,
}

pub fn finalize(stats: &SessionStats) -> Evaluation {
    let total = stats.total_judged();
    let accuracy = if total == 0 {
        0
    } else {
        let weighted = stats.perfect as f64 * judgment::accuracy_weight_for(JudgeGrade::Perfect)
            + stats.great as f64 * judgment::accuracy_weight_for(JudgeGrade::Great)
            + stats.good as f64 * judgment::accuracy_weight_for(JudgeGrade::Good);
        (100.0 * weighted / total as f64).round() as u32
    };

    Evaluation {
        score: stats.score,
        max_combo: stats.max_combo,
        perfect: stats.perfect,
        great: stats.great,
        good: stats.good,
        miss: stats.miss,
        total,
        accuracy,
        rank: rank_for_accuracy(accuracy),
    }
}

#[cfg(test)]
mod tests {
    use super::{Rank, SessionStats, finalize, rank_for_accuracy};
    use crate::game::judgment::JudgeGrade;

    #[test]
    fn combo_breaks_on_miss_and_max_combo_sticks() {
        let mut stats = SessionStats::new();
        stats.record_hit(JudgeGrade::Good);
        stats.record_hit(JudgeGrade::Good);
        stats.record_hit(JudgeGrade::Good);
        assert_eq!(stats.combo, 3);
        stats.record_miss();
        assert_eq!(stats.combo, 0);
        assert_eq!(stats.max_combo, 3);
        assert_eq!(stats.miss, 1);
    }

    #[test]
    fn max_combo_never_drops_below_combo() {
        let mut stats = SessionStats::new();
        for _ in 0..5 {
            stats.record_hit(JudgeGrade::Perfect);
            assert!(stats.max_combo >= stats.combo);
        }
        stats.record_miss();
        assert!(stats.max_combo >= stats.combo);
        stats.record_hit(JudgeGrade::Great);
        assert!(stats.max_combo >= stats.combo);
        assert_eq!(stats.max_combo, 5);
    }

    #[test]
    fn accuracy_is_zero_when_nothing_was_judged() {
        let evaluation = finalize(&SessionStats::new());
        assert_eq!(evaluation.accuracy, 0);
        assert_eq!(evaluation.total, 0);
        assert_eq!(evaluation.rank, Rank::F);
    }

    #[test]
    fn all_perfects_score_full_accuracy() {
        let mut stats = SessionStats::new();
        for _ in 0..10 {
            stats.record_hit(JudgeGrade::Perfect);
        }
        let evaluation = finalize(&stats);
        assert_eq!(evaluation.accuracy, 100);
        assert_eq!(evaluation.rank, Rank::S);
        assert_eq!(evaluation.score, 1000);
    }

    #[test]
    fn accuracy_stays_in_range_with_misses() {
        let mut stats = SessionStats::new();
        stats.record_hit(JudgeGrade::Great);
        stats.record_hit(JudgeGrade::Good);
        stats.record_miss();
        stats.record_miss();
        let evaluation = finalize(&stats);
        // (0.75 + 0.5) / 4 = 31.25 -> 31
        assert_eq!(evaluation.accuracy, 31);
        assert!(evaluation.accuracy <= 100);
    }

    #[test]
    fn rank_bounds_are_closed_below() {
        assert_eq!(rank_for_accuracy(95), Rank::S);
        assert_eq!(rank_for_accuracy(94), Rank::A);
        assert_eq!(rank_for_accuracy(90), Rank::A);
        assert_eq!(rank_for_accuracy(89), Rank::B);
        assert_eq!(rank_for_accuracy(80), Rank::B);
        assert_eq!(rank_for_accuracy(70), Rank::C);
        assert_eq!(rank_for_accuracy(60), Rank::D);
        assert_eq!(rank_for_accuracy(59), Rank::F);
        assert_eq!(rank_for_accuracy(100), Rank::S);
        assert_eq!(rank_for_accuracy(0), Rank::F);
    }
}
