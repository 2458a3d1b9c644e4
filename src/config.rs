use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Mutex;

const SETTINGS_INI_PATH: &str = "save/settings.ini";

// Poll period shared by the spawn and kinematic ticks (~60 Hz).
pub const TICK_INTERVAL_MS: u64 = 16;

// Default balance constants. Every value here is a tunable; hosts override
// them through save/settings.ini without touching the judging code.
pub const DEFAULT_LEAD_TIME_MS: f32 = 2000.0;
pub const DEFAULT_TRAVEL_STEP: f32 = 1.0;
pub const DEFAULT_HIT_LINE: f32 = 100.0;
pub const DEFAULT_PERFECT_WINDOW: f32 = 25.0;
pub const DEFAULT_GREAT_WINDOW: f32 = 50.0;
pub const DEFAULT_GOOD_WINDOW: f32 = 85.0;
pub const DEFAULT_MISS_TRAVEL: f32 = 150.0;
pub const DEFAULT_CULL_TRAVEL: f32 = 200.0;
pub const DEFAULT_FADE_MS: u64 = 300;
pub const DEFAULT_FEEDBACK_MS: u64 = 500;
pub const DEFAULT_END_GRACE_MS: u64 = 1000;

/// Session tunables. The engine takes a snapshot at init so a reload of the
/// ini file never changes the rules of a session already in flight.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Spawn lead: a note appears this many ms before its scheduled arrival.
    pub lead_time_ms: f32,
    /// Travel units added per kinematic tick.
    pub travel_step: f32,
    /// Travel value of the hit line; judgment distance is measured from it.
    pub hit_line: f32,
    pub perfect_window: f32,
    pub great_window: f32,
    pub good_window: f32,
    /// Travel past which an unjudged note counts as missed. Kept well above
    /// the hit line so late hits stay possible (widened from 105 to 150).
    pub miss_travel: f32,
    /// Travel past which any note is pruned, missed ones included.
    pub cull_travel: f32,
    /// How long a judged note stays visible while fading out.
    pub fade_ms: u64,
    /// How long the judgment feedback label stays up.
    pub feedback_ms: u64,
    /// Grace period between the audio-end signal and session completion,
    /// letting trailing notes resolve.
    pub end_grace_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lead_time_ms: DEFAULT_LEAD_TIME_MS,
            travel_step: DEFAULT_TRAVEL_STEP,
            hit_line: DEFAULT_HIT_LINE,
            perfect_window: DEFAULT_PERFECT_WINDOW,
            great_window: DEFAULT_GREAT_WINDOW,
            good_window: DEFAULT_GOOD_WINDOW,
            miss_travel: DEFAULT_MISS_TRAVEL,
            cull_travel: DEFAULT_CULL_TRAVEL,
            fade_ms: DEFAULT_FADE_MS,
            feedback_ms: DEFAULT_FEEDBACK_MS,
            end_grace_ms: DEFAULT_END_GRACE_MS,
        }
    }
}

static SETTINGS: Lazy<Mutex<Settings>> = Lazy::new(|| Mutex::new(Settings::default()));

fn read_f32(conf: &Ini, section: &str, key: &str, fallback: f32) -> f32 {
    conf.get(section, key)
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(fallback)
}

fn read_u64(conf: &Ini, section: &str, key: &str, fallback: u64) -> u64 {
    conf.get(section, key)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(fallback)
}

/// Loads overrides from save/settings.ini into the global settings.
/// A missing file or malformed key falls back to the compiled defaults.
pub fn load() {
    if !Path::new(SETTINGS_INI_PATH).exists() {
        info!("No '{}' found, using default settings.", SETTINGS_INI_PATH);
        return;
    }

    let mut conf = Ini::new();
    if conf.load(SETTINGS_INI_PATH).is_err() {
        warn!("Failed to load '{}', using default settings.", SETTINGS_INI_PATH);
        return;
    }

    let defaults = Settings::default();
    let loaded = Settings {
        lead_time_ms: read_f32(&conf, "timing", "LeadTimeMs", defaults.lead_time_ms),
        travel_step: read_f32(&conf, "timing", "TravelStep", defaults.travel_step),
        hit_line: read_f32(&conf, "judge", "HitLine", defaults.hit_line),
        perfect_window: read_f32(&conf, "judge", "PerfectWindow", defaults.perfect_window),
        great_window: read_f32(&conf, "judge", "GreatWindow", defaults.great_window),
        good_window: read_f32(&conf, "judge", "GoodWindow", defaults.good_window),
        miss_travel: read_f32(&conf, "judge", "MissTravel", defaults.miss_travel),
        cull_travel: read_f32(&conf, "judge", "CullTravel", defaults.cull_travel),
        fade_ms: read_u64(&conf, "presentation", "FadeMs", defaults.fade_ms),
        feedback_ms: read_u64(&conf, "presentation", "FeedbackMs", defaults.feedback_ms),
        end_grace_ms: read_u64(&conf, "timing", "EndGraceMs", defaults.end_grace_ms),
    };

    if loaded.perfect_window > loaded.great_window || loaded.great_window > loaded.good_window {
        warn!(
            "Judge windows not ascending ({} / {} / {}), using defaults.",
            loaded.perfect_window, loaded.great_window, loaded.good_window
        );
        return;
    }
    if loaded.miss_travel <= loaded.hit_line {
        warn!(
            "MissTravel {} must exceed HitLine {}, using defaults.",
            loaded.miss_travel, loaded.hit_line
        );
        return;
    }

    info!("Loaded settings overrides from '{}'.", SETTINGS_INI_PATH);
    *SETTINGS.lock().unwrap() = loaded;
}

/// Returns a copy of the current settings.
pub fn get() -> Settings {
    *SETTINGS.lock().unwrap()
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn default_windows_are_ascending() {
        let s = Settings::default();
        assert!(s.perfect_window < s.great_window);
        assert!(s.great_window < s.good_window);
    }

    #[test]
    fn default_travel_bounds_are_ordered() {
        let s = Settings::default();
        assert!(s.hit_line < s.miss_travel, "miss threshold must sit past the hit line");
        assert!(s.miss_travel < s.cull_travel, "cull bound must keep missed notes visible");
    }
}
