//! `facelive replay` — feeds a recorded detection log through the engine.
//!
//! Each non-empty line of the log is one [`DetectionEvent`] in JSON, for
//! example:
//!
//! ```text
//! {"event":"face","observation":{"bounding_box":{"left":150,"top":150,"right":350,"bottom":350},"left_eye_open_probability":0.04,"right_eye_open_probability":0.06,"timestamp_millis":1100},"frame":{"width":480,"height":640}}
//! {"event":"no_face"}
//! ```

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use facelive_core::{DetectionEvent, LivenessEngine, LivenessState};
use facelive_session::SessionConfig;

/// Summary of one replayed log.
#[derive(Debug)]
pub struct ReplaySummary {
    pub events: usize,
    pub final_state: LivenessState,
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config = match path {
        Some(p) => SessionConfig::load(p)?,
        None => SessionConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

/// Replay every event from `reader`, writing one line per emitted state to `out`.
pub fn replay<R: BufRead, W: Write>(
    engine: &mut LivenessEngine,
    reader: R,
    out: &mut W,
    json: bool,
) -> Result<ReplaySummary> {
    let mut events = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: DetectionEvent = serde_json::from_str(line)
            .with_context(|| format!("malformed detection event on line {line_no}"))?;
        let state = engine.handle(event);
        events += 1;

        if json {
            writeln!(out, "{}", serde_json::to_string(state)?)?;
        } else {
            writeln!(out, "{line_no:>5}  {state}")?;
        }
    }

    Ok(ReplaySummary {
        events,
        final_state: engine.state().clone(),
    })
}

/// Run the replay command.
pub fn run(log: &Path, config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let mut engine = LivenessEngine::new(config.liveness)?;

    let file = fs::File::open(log).with_context(|| format!("failed to open {}", log.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let summary = replay(&mut engine, BufReader::new(file), &mut out, json)?;
    tracing::info!(events = summary.events, "replay finished");

    if !json {
        writeln!(out)?;
        writeln!(out, "{} event(s) replayed, final state: {}", summary.events, summary.final_state)?;
    }
    Ok(())
}

/// Print the default configuration.
pub fn print_defaults() -> Result<()> {
    let text = SessionConfig::default()
        .to_toml()
        .context("failed to serialize default configuration")?;
    print!("{text}");
    Ok(())
}

/// Validate a configuration file.
pub fn check_config(path: &Path) -> Result<()> {
    load_config(Some(path))?;
    println!("{}: ok", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use facelive_core::LivenessConfig;

    use super::*;

    const LOG: &str = r#"
{"event":"face","observation":{"bounding_box":{"left":150,"top":150,"right":350,"bottom":350},"left_eye_open_probability":0.95,"right_eye_open_probability":0.93,"timestamp_millis":1000},"frame":{"width":480,"height":640}}
{"event":"face","observation":{"bounding_box":{"left":150,"top":150,"right":350,"bottom":350},"left_eye_open_probability":0.04,"right_eye_open_probability":0.06,"timestamp_millis":1100},"frame":{"width":480,"height":640}}
{"event":"face","observation":{"bounding_box":{"left":150,"top":150,"right":350,"bottom":350},"left_eye_open_probability":0.95,"right_eye_open_probability":0.93,"timestamp_millis":1200},"frame":{"width":480,"height":640}}
{"event":"no_face"}
"#;

    fn engine(required_blinks: u32) -> LivenessEngine {
        LivenessEngine::new(LivenessConfig {
            required_blinks,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_replay_prints_each_state() {
        let mut engine = engine(2);
        let mut out = Vec::new();
        let summary = replay(&mut engine, LOG.as_bytes(), &mut out, false).unwrap();

        assert_eq!(summary.events, 4);
        assert!(summary.final_state.is_failed());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("processing: Detected 0/2 blinks."));
        assert!(lines[1].ends_with("processing: Detected 1/2 blinks."));
        assert!(lines[3].ends_with("failed: No face detected"));
    }

    #[test]
    fn test_replay_json_output() {
        let mut engine = engine(1);
        let mut out = Vec::new();
        replay(&mut engine, LOG.as_bytes(), &mut out, true).unwrap();

        let text = String::from_utf8(out).unwrap();
        let states: Vec<LivenessState> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(states.len(), 4);
        assert!(states[1].is_success());
        // Latched: the later open-eye frame and the lost face keep reporting success
        assert!(states[3].is_success());
    }

    #[test]
    fn test_replay_reports_bad_line() {
        let mut engine = engine(1);
        let mut out = Vec::new();
        let log = "{\"event\":\"no_face\"}\n{\"event\":\"sideways\"}\n";
        let err = replay(&mut engine, log.as_bytes(), &mut out, false).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
