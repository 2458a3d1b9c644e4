use crate::core::input::Lane;
use crate::game::judgment::JudgeGrade;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArrowState {
    /// Advancing toward the hit line, eligible for judging.
    Live,
    /// Judged (hit or distance-miss); frozen and fading until `remove_at`.
    Resolving,
    /// Timed out unjudged; keeps advancing until the cull bound prunes it.
    Missed,
}

#[derive(Clone, Debug)]
pub struct Arrow {
    pub id: u64,
    pub lane: Lane,
    /// 1-D progress from spawn (0.0) toward and past the hit line.
    pub travel: f32,
    pub state: ArrowState,
    pub result: Option<JudgeGrade>,
    /// Fade-out deadline in session ms, set the instant the arrow resolves.
    pub remove_at: Option<u64>,
}

impl Arrow {
    #[inline(always)]
    pub fn is_judgeable(&self) -> bool {
        matches!(self.state, ArrowState::Live)
    }
}

/// Travel units spanned by one full viewport height.
const TRAVEL_PER_VIEWPORT: f32 = 100.0;

/// Projects a travel value to a vertical pixel position, bottom of the
/// viewport at spawn, hit line near the top. Position is derived, never
/// stored: a viewport resize re-runs this with the same travel.
pub fn arrow_y_position(travel: f32, viewport_height: f32) -> f32 {
    viewport_height - viewport_height * travel / TRAVEL_PER_VIEWPORT
}
