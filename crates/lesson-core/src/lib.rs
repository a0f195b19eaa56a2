//! Sequenced audio playback for lesson slides.
//!
//! `sequencer` drives the clip/gap loop against an `AudioManager` and reports
//! to a `PlaybackView`; the remaining modules are the pieces it is built on.
//!
//! Quiz and typing slides do not use the sequencer's clip loop. They time
//! each question with `decision::await_decision`, check typed or assembled
//! answers with `content::answers_match`, and tally with
//! `decision::ScoreCard` for the completion screen. The terminal player only
//! plays audio, so it leaves these to front ends that render such slides.

pub mod audio;
pub mod cancellation;
pub mod config;
pub mod content;
pub mod decision;
pub mod gap;
pub mod profile;
pub mod sequencer;
pub mod view;
pub mod wait;

use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Regenerate the TypeScript types a web front end needs to render
/// `ViewEvent`s and snapshots.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<gap::PlaybackMode>(out_dir)?;
    export_single_type::<sequencer::PlaybackState>(out_dir)?;
    export_single_type::<sequencer::PlaybackSnapshot>(out_dir)?;
    export_single_type::<view::HighlightState>(out_dir)?;
    export_single_type::<view::ControlsView>(out_dir)?;
    export_single_type::<view::ViewEvent>(out_dir)?;

    let index_content = r#"export type { PlaybackMode } from "./PlaybackMode";
export type { PlaybackState } from "./PlaybackState";
export type { PlaybackSnapshot } from "./PlaybackSnapshot";
export type { HighlightState } from "./HighlightState";
export type { ControlsView } from "./ControlsView";
export type { ViewEvent } from "./ViewEvent";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {err}",
            out_dir.join("index.ts").display()
        )
    })?;

    Ok(())
}
