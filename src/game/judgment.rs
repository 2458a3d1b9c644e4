use crate::core::input::Lane;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JudgeGrade {
    Perfect,
    Great,
    Good,
    Miss,
}

impl JudgeGrade {
    /// Feedback label shown to the player.
    pub const fn label(self) -> &'static str {
        match self {
            JudgeGrade::Perfect => "PERFECT!",
            JudgeGrade::Great => "GREAT!",
            JudgeGrade::Good => "GOOD",
            JudgeGrade::Miss => "MISS!",
        }
    }
}

pub const fn grade_points_for(grade: JudgeGrade) -> u64 {
    match grade {
        JudgeGrade::Perfect => 100,
        JudgeGrade::Great => 50,
        JudgeGrade::Good => 10,
        JudgeGrade::Miss => 0,
    }
}

/// Accuracy weight of a judged note, as a fraction of a Perfect.
pub const fn accuracy_weight_for(grade: JudgeGrade) -> f64 {
    match grade {
        JudgeGrade::Perfect => 1.0,
        JudgeGrade::Great => 0.75,
        JudgeGrade::Good => 0.5,
        JudgeGrade::Miss => 0.0,
    }
}

/// Distance bands for tap judging, in travel units from the hit line.
/// Ascending, boundaries inclusive.
#[derive(Clone, Copy, Debug)]
pub struct JudgeWindows {
    pub perfect: f32,
    pub great: f32,
    pub good: f32,
}

pub fn grade_for_distance(distance: f32, windows: &JudgeWindows) -> JudgeGrade {
    if distance <= windows.perfect {
        JudgeGrade::Perfect
    } else if distance <= windows.great {
        JudgeGrade::Great
    } else if distance <= windows.good {
        JudgeGrade::Good
    } else {
        JudgeGrade::Miss
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Judgment {
    pub grade: JudgeGrade,
    /// Absolute distance from the hit line at press time, in travel units.
    pub distance: f32,
    pub lane: Lane,
}

#[cfg(test)]
mod tests {
    use super::{JudgeGrade, JudgeWindows, grade_for_distance, grade_points_for};

    const WINDOWS: JudgeWindows = JudgeWindows {
        perfect: 25.0,
        great: 50.0,
        good: 85.0,
    };

    #[test]
    fn bands_are_closed_on_the_upper_bound() {
        assert_eq!(grade_for_distance(25.0, &WINDOWS), JudgeGrade::Perfect);
        assert_eq!(grade_for_distance(50.0, &WINDOWS), JudgeGrade::Great);
        assert_eq!(grade_for_distance(85.0, &WINDOWS), JudgeGrade::Good);
    }

    #[test]
    fn bands_cover_all_distances() {
        assert_eq!(grade_for_distance(0.0, &WINDOWS), JudgeGrade::Perfect);
        assert_eq!(grade_for_distance(25.1, &WINDOWS), JudgeGrade::Great);
        assert_eq!(grade_for_distance(50.1, &WINDOWS), JudgeGrade::Good);
        assert_eq!(grade_for_distance(85.1, &WINDOWS), JudgeGrade::Miss);
        assert_eq!(grade_for_distance(1000.0, &WINDOWS), JudgeGrade::Miss);
    }

    #[test]
    fn points_decrease_with_grade() {
        assert!(grade_points_for(JudgeGrade::Perfect) > grade_points_for(JudgeGrade::Great));
        assert!(grade_points_for(JudgeGrade::Great) > grade_points_for(JudgeGrade::Good));
        assert_eq!(grade_points_for(JudgeGrade::Miss), 0);
    }
}
