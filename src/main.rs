use chrono::Utc;
use log::{LevelFilter, error, info};
use rand::Rng;
use serde::Serialize;
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use stepline::config;
use stepline::core::clock::SessionClock;
use stepline::core::input::{InputSource, Lane};
use stepline::game::chart::{self, ChartData};
use stepline::game::gameplay::{self, State};
use stepline::game::scores::Evaluation;

const SESSION_LOG_PATH: &str = "save/sessions.jsonl";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut chart_path = None;
    let mut use_stdin = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--stdin" => use_stdin = true,
            "--autoplay" => use_stdin = false,
            other if chart_path.is_none() => chart_path = Some(other.to_string()),
            other => return Err(format!("Unexpected argument '{}'", other).into()),
        }
    }
    let Some(chart_path) = chart_path else {
        eprintln!("Usage: stepline <chart.json> [--autoplay | --stdin]");
        eprintln!("  --autoplay  bot plays the chart (default)");
        eprintln!("  --stdin     read pad messages like {{\"direction\": \"left\"}} per line");
        return Err("No chart file given".into());
    };

    config::load();
    let settings = config::get();
    let chart = chart::load_chart(Path::new(&chart_path))?;

    let evaluation = run_session(chart.clone(), settings, use_stdin);
    print_evaluation(&evaluation);
    if let Err(e) = append_session_record(&chart, &evaluation) {
        error!("Failed to write session record: {}", e);
    }
    Ok(())
}

fn run_session(chart: std::sync::Arc<ChartData>, settings: config::Settings, use_stdin: bool) -> Evaluation {
    let remote = use_stdin.then(spawn_stdin_reader);
    let mut bot = (!use_stdin).then(|| AutoplayBot::new(settings.hit_line));
    if use_stdin {
        info!("Waiting for pad messages on stdin.");
    } else {
        info!("Autoplay session.");
    }

    // The demo has no real audio track; it stands in for the audio
    // collaborator by declaring the track over once the last note has had
    // time to reach and clear the hit zone.
    let track_end_ms = chart
        .steps
        .last()
        .map(|step| step.beat * chart.ms_per_beat() + settings.lead_time_ms)
        .unwrap_or(0.0) as u64
        + 2000;

    let clock = SessionClock::start();
    let mut state = gameplay::init(chart, settings);
    let mut audio_ended = false;

    loop {
        let now = clock.elapsed_ms();

        // Spawn and kinematic passes run at the same fixed period but stay
        // independent; nothing below relies on their relative order.
        gameplay::spawn_tick(&mut state, now);
        gameplay::advance_tick(&mut state, now);

        if let Some(receiver) = &remote {
            while let Ok(line) = receiver.try_recv() {
                gameplay::handle_remote_message(&mut state, &line);
            }
        }
        if let Some(bot) = &mut bot {
            bot.press_due_lanes(&mut state);
        }
        gameplay::process_pending_inputs(&mut state, now);

        if !audio_ended && now >= track_end_ms {
            audio_ended = true;
            gameplay::notify_audio_ended(&mut state, now);
        }
        if gameplay::is_complete(&state) {
            break;
        }

        thread::sleep(Duration::from_millis(config::TICK_INTERVAL_MS));
    }

    gameplay::finalize(&state)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

/// Presses each lane as its next live arrow reaches the hit line, with a
/// little jitter so the session exercises more than one judgment tier.
struct AutoplayBot {
    hit_line: f32,
    triggers: [Option<f32>; 4],
}

impl AutoplayBot {
    fn new(hit_line: f32) -> Self {
        Self {
            hit_line,
            triggers: [None; 4],
        }
    }

    fn press_due_lanes(&mut self, state: &mut State) {
        let mut rng = rand::rng();
        let hit_line = self.hit_line;
        for lane in Lane::ALL {
            let next_travel = state.arrows[lane.index()]
                .iter()
                .find(|arrow| arrow.is_judgeable())
                .map(|arrow| arrow.travel);
            let Some(travel) = next_travel else {
                self.triggers[lane.index()] = None;
                continue;
            };

            let trigger = *self.triggers[lane.index()]
                .get_or_insert_with(|| hit_line - rng.random_range(0.0..30.0));
            if travel >= trigger {
                gameplay::queue_input(state, lane, InputSource::Keyboard);
                self.triggers[lane.index()] = None;
            }
        }
    }
}

fn print_evaluation(evaluation: &Evaluation) {
    println!();
    println!("==== RESULTS ====");
    println!("Score:     {}", evaluation.score);
    println!("Max combo: {}", evaluation.max_combo);
    println!("Perfect:   {}", evaluation.perfect);
    println!("Great:     {}", evaluation.great);
    println!("Good:      {}", evaluation.good);
    println!("Miss:      {}", evaluation.miss);
    println!("Accuracy:  {}%", evaluation.accuracy);
    println!("Rank:      {}", evaluation.rank);
}

#[derive(Serialize)]
struct SessionRecord<'a> {
    timestamp: String,
    song: &'a str,
    #[serde(flatten)]
    evaluation: Evaluation,
}

fn append_session_record(chart: &ChartData, evaluation: &Evaluation) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all("save")?;
    let record = SessionRecord {
        timestamp: Utc::now().to_rfc3339(),
        song: &chart.metadata.title,
        evaluation: *evaluation,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(SESSION_LOG_PATH)?;
    writeln!(file, "{}", serde_json::to_string(&record)?)?;
    info!("Appended session record to '{}'.", SESSION_LOG_PATH);
    Ok(())
}
