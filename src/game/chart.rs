use crate::core::input::Lane;
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Song header as served by the song-data backend. Fields the judging core
/// does not use (audio path, per-section bpms) ride along for the host.
#[derive(Clone, Debug, Deserialize)]
pub struct SongMetadata {
    #[serde(default)]
    pub title: String,
    pub bpm: f32,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub offset: f32,
    /// Per-section tempo changes in the source format. Only the initial
    /// `bpm` drives scheduling; the rest is preserved untouched.
    #[serde(default)]
    pub bpms: Vec<(f32, f32)>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    pub beat: f32,
    /// One flag per lane; any value above zero means the lane is active.
    /// Larger magnitudes are reserved for future note types.
    pub arrows: [u8; 4],
}

impl Step {
    pub fn active_lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        self.arrows
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag > 0)
            .filter_map(|(index, _)| Lane::from_index(index))
    }
}

/// A loaded beatmap. Immutable for the whole session.
#[derive(Clone, Debug, Deserialize)]
pub struct ChartData {
    pub metadata: SongMetadata,
    pub steps: Vec<Step>,
}

impl ChartData {
    pub fn from_json(raw: &str) -> Result<ChartData, Box<dyn Error>> {
        let chart: ChartData = serde_json::from_str(raw)?;
        chart.validate()?;
        Ok(chart)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !self.metadata.bpm.is_finite() || self.metadata.bpm <= 0.0 {
            return Err(format!("Chart bpm must be positive, got {}", self.metadata.bpm).into());
        }

        let mut last_beat = 0.0f32;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.beat.is_finite() || step.beat < 0.0 {
                return Err(format!("Step {} has invalid beat {}", index, step.beat).into());
            }
            if step.beat < last_beat {
                return Err(format!(
                    "Step {} beat {} is earlier than the previous beat {}",
                    index, step.beat, last_beat
                )
                .into());
            }
            last_beat = step.beat;
        }
        Ok(())
    }

    /// Milliseconds per beat at the session tempo.
    pub fn ms_per_beat(&self) -> f32 {
        60_000.0 / self.metadata.bpm
    }
}

/// Loads and validates a chart file. Any failure here is reported to the
/// song-loading collaborator; the engine never starts on a bad chart.
pub fn load_chart(path: &Path) -> Result<Arc<ChartData>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read chart '{}': {}", path.display(), e))?;
    let chart = ChartData::from_json(&raw)?;
    info!(
        "Loaded chart '{}': {} bpm, {} steps.",
        chart.metadata.title,
        chart.metadata.bpm,
        chart.steps.len()
    );
    Ok(Arc::new(chart))
}
