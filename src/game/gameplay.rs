use crate::config::Settings;
use crate::core::input::{InputEvent, InputSource, Lane, lane_from_keycode, lane_from_message};
use crate::game::chart::ChartData;
use crate::game::judgment::{self, JudgeGrade, JudgeWindows, Judgment};
use crate::game::note::{Arrow, ArrowState};
use crate::game::scores::{self, Evaluation, SessionStats};
use log::info;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::PhysicalKey;

/// Transient judgment readout (tier label + lane) for the rendering
/// collaborator. Exposed by the engine, owned by nobody else; self-clears
/// once `clear_at` passes.
#[derive(Clone, Copy, Debug)]
pub struct Feedback {
    pub grade: JudgeGrade,
    pub lane: Lane,
    clear_at: u64,
}

impl Feedback {
    pub fn label(&self) -> &'static str {
        self.grade.label()
    }
}

/// Engine-owned session state. All mutation happens on the host's single
/// logical thread: the two fixed ticks and the input handlers interleave
/// there, so no locking is needed. Teardown is dropping the state and
/// stopping the host timers; every delayed effect lives inside as a
/// deadline field, so a dead session cannot receive a stale mutation.
pub struct State {
    pub chart: Arc<ChartData>,
    pub settings: Settings,
    /// Live notes per lane, in spawn order.
    pub arrows: [Vec<Arrow>; 4],
    pub stats: SessionStats,
    pub feedback: Option<Feedback>,

    /// Beat values already turned into spawns. Keyed by value, not by step
    /// identity: two steps sharing a beat collapse to the first (documented
    /// source-format limitation, kept as-is).
    processed_beats: HashSet<u32>,
    /// First step not yet due; steps are beat-sorted so the spawn scan is
    /// bounded.
    spawn_cursor: usize,
    next_arrow_id: u64,
    pending_inputs: VecDeque<InputEvent>,
    ms_per_beat: f32,

    /// Completion deadline armed by the external audio-end signal.
    end_at: Option<u64>,
    completed: bool,

    last_status_log_ms: u64,
}

pub fn init(chart: Arc<ChartData>, settings: Settings) -> State {
    info!(
        "Starting session: '{}' at {} bpm, {} steps.",
        chart.metadata.title, chart.metadata.bpm, chart.steps.len()
    );
    let ms_per_beat = chart.ms_per_beat();
    State {
        chart,
        settings,
        arrows: [vec![], vec![], vec![], vec![]],
        stats: SessionStats::new(),
        feedback: None,
        processed_beats: HashSet::new(),
        spawn_cursor: 0,
        next_arrow_id: 0,
        pending_inputs: VecDeque::new(),
        ms_per_beat,
        end_at: None,
        completed: false,
        last_status_log_ms: 0,
    }
}

fn windows(settings: &Settings) -> JudgeWindows {
    JudgeWindows {
        perfect: settings.perfect_window,
        great: settings.great_window,
        good: settings.good_window,
    }
}

fn set_feedback(state: &mut State, grade: JudgeGrade, lane: Lane, now_ms: u64) {
    state.feedback = Some(Feedback {
        grade,
        lane,
        clear_at: now_ms + state.settings.feedback_ms,
    });
}

/// Spawn pass, polled on a fixed 16 ms timer. Turns every beatmap step
/// whose arrival time is within the lead window into live arrows.
pub fn spawn_tick(state: &mut State, now_ms: u64) {
    let now = now_ms as f32;
    while state.spawn_cursor < state.chart.steps.len() {
        let step = &state.chart.steps[state.spawn_cursor];
        let arrival_ms = step.beat * state.ms_per_beat;
        if now < arrival_ms - state.settings.lead_time_ms {
            break;
        }
        state.spawn_cursor += 1;

        if !state.processed_beats.insert(step.beat.to_bits()) {
            // Duplicate beat value: only the first step spawns.
            continue;
        }

        for lane in state.chart.steps[state.spawn_cursor - 1].active_lanes() {
            let id = state.next_arrow_id;
            state.next_arrow_id += 1;
            state.arrows[lane.index()].push(Arrow {
                id,
                lane,
                travel: 0.0,
                state: ArrowState::Live,
                result: None,
                remove_at: None,
            });
        }
    }
}

/// Kinematic pass, polled on its own fixed 16 ms timer. Ordering against
/// the spawn pass within one real-time tick is unspecified; neither pass
/// relies on the other having run first.
pub fn advance_tick(state: &mut State, now_ms: u64) {
    let settings = state.settings;

    let mut timeout_misses: u32 = 0;
    let mut last_missed_lane = None;
    for lane_arrows in &mut state.arrows {
        for arrow in lane_arrows.iter_mut() {
            // Resolving arrows are frozen at their judged position.
            if arrow.state == ArrowState::Resolving {
                continue;
            }
            arrow.travel += settings.travel_step;

            // One-time transition: side effects fire exactly once per id,
            // then the arrow keeps advancing visually until culled.
            if arrow.travel > settings.miss_travel && arrow.result.is_none() {
                arrow.state = ArrowState::Missed;
                arrow.result = Some(JudgeGrade::Miss);
                timeout_misses += 1;
                last_missed_lane = Some(arrow.lane);
                info!("MISSED: arrow {} ({})", arrow.id, arrow.lane.as_str());
            }
        }
    }
    for _ in 0..timeout_misses {
        state.stats.record_miss();
    }
    if let Some(lane) = last_missed_lane {
        set_feedback(state, JudgeGrade::Miss, lane, now_ms);
    }

    for lane_arrows in &mut state.arrows {
        lane_arrows.retain(|arrow| {
            // The cull bound prunes unconditionally, missed arrows included.
            if arrow.travel > settings.cull_travel {
                return false;
            }
            // Judged arrows leave once their fade deadline passes.
            match arrow.remove_at {
                Some(deadline) => now_ms < deadline,
                None => true,
            }
        });
    }

    if let Some(feedback) = &state.feedback {
        if now_ms >= feedback.clear_at {
            state.feedback = None;
        }
    }

    if let Some(end_at) = state.end_at {
        if now_ms >= end_at && !state.completed {
            state.completed = true;
            info!("Session complete.");
        }
    }

    if now_ms.saturating_sub(state.last_status_log_ms) >= 1000 {
        let active: usize = state.arrows.iter().map(|v| v.len()).sum();
        log::debug!(
            "Beat: {:.2}, Time: {:.2}s, Combo: {}, Active arrows: {}",
            now_ms as f32 / state.ms_per_beat,
            now_ms as f32 / 1000.0,
            state.stats.combo,
            active
        );
        state.last_status_log_ms = now_ms;
    }
}

pub fn queue_input(state: &mut State, lane: Lane, source: InputSource) {
    state.pending_inputs.push_back(InputEvent { lane, source });
}

/// Maps a winit key event onto the input queue. Repeats and releases are
/// ignored; keys with no lane mapping fall through untouched.
pub fn handle_key_event(state: &mut State, event: &KeyEvent) {
    if event.state != ElementState::Pressed || event.repeat {
        return;
    }
    if let PhysicalKey::Code(code) = event.physical_key {
        if let Some(lane) = lane_from_keycode(code) {
            queue_input(state, lane, InputSource::Keyboard);
        }
    }
}

/// Feeds a remote pad message into the input queue. Unrecognized payloads
/// are dropped with no state change.
pub fn handle_remote_message(state: &mut State, payload: &str) {
    if let Some(lane) = lane_from_message(payload) {
        queue_input(state, lane, InputSource::Remote);
    }
}

pub fn process_pending_inputs(state: &mut State, now_ms: u64) {
    while let Some(event) = state.pending_inputs.pop_front() {
        log::debug!("Input: {} via {:?}", event.lane.as_str(), event.source);
        judge_a_tap(state, event.lane, now_ms);
    }
}

/// Judges one tap in `lane` against the nearest live arrow. Returns the
/// judgment, or None when the lane has no live arrows: that press is a
/// deliberate no-op with no combo penalty and no feedback. (An earlier
/// balance generation counted it as a miss; the no-op policy superseded it.)
pub fn judge_a_tap(state: &mut State, lane: Lane, now_ms: u64) -> Option<Judgment> {
    let settings = state.settings;

    // Nearest live arrow wins; strict `<` keeps the earliest-spawned arrow
    // on exact ties, matching iteration order.
    let mut best: Option<(usize, f32)> = None;
    for (index, arrow) in state.arrows[lane.index()].iter().enumerate() {
        if !arrow.is_judgeable() {
            continue;
        }
        let distance = (arrow.travel - settings.hit_line).abs();
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    let (index, distance) = best?;

    let grade = judgment::grade_for_distance(distance, &windows(&settings));
    let arrow = &mut state.arrows[lane.index()][index];
    arrow.state = ArrowState::Resolving;
    arrow.result = Some(grade);
    arrow.remove_at = Some(now_ms + settings.fade_ms);
    let arrow_id = arrow.id;

    match grade {
        JudgeGrade::Miss => state.stats.record_miss(),
        scoring => state.stats.record_hit(scoring),
    }
    set_feedback(state, grade, lane, now_ms);

    info!(
        "JUDGED: arrow {} ({}), distance {:.1}, {:?}, combo {}",
        arrow_id,
        lane.as_str(),
        distance,
        grade,
        state.stats.combo
    );

    Some(Judgment {
        grade,
        distance,
        lane,
    })
}

/// External audio-end signal. Completion is not derived from the beatmap;
/// the audio collaborator decides when the track is over, and a grace
/// delay lets trailing notes resolve before the session finalizes.
pub fn notify_audio_ended(state: &mut State, now_ms: u64) {
    if state.end_at.is_none() {
        state.end_at = Some(now_ms + state.settings.end_grace_ms);
        info!(
            "Audio ended, finalizing in {} ms.",
            state.settings.end_grace_ms
        );
    }
}

pub fn is_complete(state: &State) -> bool {
    state.completed
}

/// True once the spawn scan has consumed the whole beatmap.
pub fn all_notes_spawned(state: &State) -> bool {
    state.spawn_cursor >= state.chart.steps.len()
}

/// Snapshot of every visible arrow for the rendering collaborator.
pub fn visible_arrows(state: &State) -> impl Iterator<Item = &Arrow> {
    state.arrows.iter().flat_map(|lane_arrows| lane_arrows.iter())
}

pub fn finalize(state: &State) -> Evaluation {
    scores::finalize(&state.stats)
}
