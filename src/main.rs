//! Terminal lesson player.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load the lesson JSON via `lesson_core::content`.
//! - Load user configuration from `conf/config.toml`.
//! - Drive one slide's `Sequencer` from stdin keys and print what it reports.

mod audio_backend;

use crate::audio_backend::RodioAudioManager;
use anyhow::{Context, Result, anyhow};
use lesson_core::config::{AppConfig, load_config};
use lesson_core::content::{Entry, Lesson, load_lesson};
use lesson_core::gap::PlaybackMode;
use lesson_core::profile::SequenceProfile;
use lesson_core::sequencer::{RunHandle, Sequencer};
use lesson_core::view::{ChannelView, HighlightState, ViewEvent};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: lesson-player <lesson.json> [--mode listen|listen-repeat|read] [--config <path>]";

#[derive(Debug, PartialEq)]
struct CliArgs {
    lesson_path: PathBuf,
    mode: Option<PlaybackMode>,
    config_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    TogglePlayPause,
    Restart,
    Quit,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    if !args.lesson_path.exists() {
        return Err(anyhow!("File not found: {}", args.lesson_path.display()));
    }
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let lesson = load_lesson(&args.lesson_path)?;
    let profile = lesson_profile(&config, &lesson, args.mode);
    let audio_root = config
        .audio_root
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            args.lesson_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        });
    info!(
        path = %args.lesson_path.display(),
        title = lesson.title.as_deref().unwrap_or("untitled"),
        mode = %profile.mode,
        next_up = ?profile.next_up,
        entries = lesson.entries.len(),
        level = %config.log_level,
        "Starting lesson player"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lesson-player")
        .build()
        .context("Building async runtime")?;
    runtime.block_on(play_lesson(lesson, profile, audio_root, &config))
}

/// CLI mode beats the lesson's own mode, which beats the configured default.
fn lesson_profile(config: &AppConfig, lesson: &Lesson, cli_mode: Option<PlaybackMode>) -> SequenceProfile {
    let mode = cli_mode.or(lesson.mode).unwrap_or(config.default_mode);
    let mut profile = SequenceProfile::from_config(mode, config);
    if let Some(repeat_pause_ms) = lesson.repeat_pause_ms {
        profile.gaps = profile.gaps.with_repeat_pause_ms(repeat_pause_ms);
    }
    profile
}

async fn play_lesson(
    lesson: Lesson,
    profile: SequenceProfile,
    audio_root: PathBuf,
    config: &AppConfig,
) -> Result<()> {
    let audio = Arc::new(RodioAudioManager::new(audio_root, config.audio_volume)?);
    let (view, events) = ChannelView::new();
    let sequencer = Sequencer::new(lesson.entries.clone(), profile, audio, Arc::new(view));
    let renderer = tokio::spawn(render_events(events, lesson.entries));

    let (quit_tx, mut quit_rx) = mpsc::unbounded_channel::<()>();
    let interrupt_sequencer = sequencer.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; leaving slide");
        interrupt_sequencer.leave();
        let _ = quit_tx.send(());
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }

    println!(
        "[{}] play/pause  [{}] restart  [{}] quit",
        config.key_toggle_play_pause, config.key_restart, config.key_quit
    );
    let mut current_run: Option<RunHandle> = sequencer.start();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = quit_rx.recv() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Reading stdin")? else {
                    debug!("stdin closed; waiting for the active run");
                    if let Some(run) = current_run.take() {
                        match run.await {
                            Ok(outcome) => info!(?outcome, "Playback run finished"),
                            Err(err) => warn!("Playback run failed to join: {err}"),
                        }
                    }
                    break;
                };
                match key_command(line.trim(), config) {
                    Some(KeyCommand::TogglePlayPause) => {
                        if let Some(run) = sequencer.toggle() {
                            current_run = Some(run);
                        }
                    }
                    Some(KeyCommand::Restart) => {
                        if let Some(run) = sequencer.start() {
                            current_run = Some(run);
                        }
                    }
                    Some(KeyCommand::Quit) => {
                        sequencer.leave();
                        break;
                    }
                    None => debug!(input = %line.trim(), "Ignoring unknown key"),
                }
            }
        }
    }

    sequencer.leave();
    renderer.abort();
    info!("Lesson player exiting");
    Ok(())
}

async fn render_events(mut events: mpsc::UnboundedReceiver<ViewEvent>, entries: Vec<Entry>) {
    while let Some(event) = events.recv().await {
        match event {
            ViewEvent::Status { text } if !text.is_empty() => println!("  {text}"),
            ViewEvent::Highlight {
                entry,
                segment,
                state: HighlightState::Playing,
            } => {
                if let Some(seg) = entries.get(entry).and_then(|e| e.segments.get(segment)) {
                    println!("> {}", seg.text);
                }
            }
            ViewEvent::Controls { controls } => {
                debug!(label = %controls.label, enabled = controls.enabled, "Controls updated");
            }
            ViewEvent::Completed => println!("  (press restart to hear it again)"),
            _ => {}
        }
    }
}

fn key_command(input: &str, config: &AppConfig) -> Option<KeyCommand> {
    if input.is_empty() {
        return None;
    }
    if input == config.key_toggle_play_pause {
        Some(KeyCommand::TogglePlayPause)
    } else if input == config.key_restart {
        Some(KeyCommand::Restart)
    } else if input == config.key_quit {
        Some(KeyCommand::Quit)
    } else {
        None
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut lesson_path = None;
    let mut mode = None;
    let mut config_path = PathBuf::from("conf/config.toml");

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--mode=") {
            mode = Some(parse_mode(value)?);
        } else if arg == "--mode" {
            let value = args.next().ok_or_else(|| anyhow!("--mode needs a value\n{USAGE}"))?;
            mode = Some(parse_mode(&value)?);
        } else if arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
            config_path = PathBuf::from(value);
        } else if arg.starts_with("--") {
            return Err(anyhow!("Unknown option {arg}\n{USAGE}"));
        } else if lesson_path.is_none() {
            lesson_path = Some(PathBuf::from(arg));
        } else {
            return Err(anyhow!("Unexpected argument {arg}\n{USAGE}"));
        }
    }

    Ok(CliArgs {
        lesson_path: lesson_path.ok_or_else(|| anyhow!(USAGE))?,
        mode,
        config_path,
    })
}

fn parse_mode(value: &str) -> Result<PlaybackMode> {
    value
        .parse()
        .map_err(|err| anyhow!("{err}"))
        .with_context(|| format!("Invalid --mode value {value:?}"))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_reads_path_mode_and_config() {
        let parsed = parse_args(args(&[
            "lesson.json",
            "--mode",
            "listen-repeat",
            "--config",
            "alt.toml",
        ]))
        .expect("args should parse");
        assert_eq!(
            parsed,
            CliArgs {
                lesson_path: PathBuf::from("lesson.json"),
                mode: Some(PlaybackMode::ListenRepeat),
                config_path: PathBuf::from("alt.toml"),
            }
        );

        let inline = parse_args(args(&["--mode=read", "lesson.json"])).expect("args should parse");
        assert_eq!(inline.mode, Some(PlaybackMode::Read));
        assert_eq!(inline.config_path, PathBuf::from("conf/config.toml"));
    }

    #[test]
    fn parse_args_rejects_bad_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.json", "b.json"])).is_err());
        assert!(parse_args(args(&["a.json", "--mode", "karaoke"])).is_err());
        assert!(parse_args(args(&["a.json", "--volume", "3"])).is_err());
    }

    #[test]
    fn key_commands_follow_config() {
        let mut config = AppConfig::default();
        assert_eq!(key_command("p", &config), Some(KeyCommand::TogglePlayPause));
        assert_eq!(key_command("s", &config), Some(KeyCommand::Restart));
        assert_eq!(key_command("q", &config), Some(KeyCommand::Quit));
        assert_eq!(key_command("", &config), None);

        config.key_quit = "x".to_string();
        assert_eq!(key_command("q", &config), None);
        assert_eq!(key_command("x", &config), Some(KeyCommand::Quit));
    }

    #[test]
    fn shipped_config_and_demo_lesson_load() {
        let config = lesson_core::config::parse_config(include_str!("../conf/config.toml"))
            .expect("shipped config should parse");
        assert_eq!(config.log_level, lesson_core::config::LogLevel::Info);
        assert_eq!(config.audio_root, None);

        let lesson = lesson_core::content::parse_lesson(include_str!("../demos/greetings.json"))
            .expect("demo lesson should parse");
        assert_eq!(lesson.entries.len(), 3);
        assert_eq!(lesson.entries[2].segments.len(), 2);
        assert_eq!(
            lesson_profile(&config, &lesson, None).gaps.repeat_pause_ms,
            1800
        );
    }

    #[test]
    fn lesson_settings_override_config_and_cli_wins() {
        let config = AppConfig::default();
        let lesson = Lesson {
            title: None,
            mode: Some(PlaybackMode::ListenRepeat),
            repeat_pause_ms: Some(2500),
            entries: Vec::new(),
        };

        let from_lesson = lesson_profile(&config, &lesson, None);
        assert_eq!(from_lesson.mode, PlaybackMode::ListenRepeat);
        assert_eq!(from_lesson.gaps.repeat_pause_ms, 2500);

        let from_cli = lesson_profile(&config, &lesson, Some(PlaybackMode::Read));
        assert_eq!(from_cli.mode, PlaybackMode::Read);

        let bare = Lesson {
            mode: None,
            repeat_pause_ms: None,
            ..lesson
        };
        assert_eq!(lesson_profile(&config, &bare, None).mode, config.default_mode);
    }
}
