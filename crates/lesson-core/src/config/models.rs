use crate::gap::{GapOptions, PlaybackMode};
use crate::profile::NextUpPolicy;
use serde::Deserialize;

/// Flat playback configuration; the on-disk layout lives in `tables`.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_mode")]
    pub default_mode: PlaybackMode,
    #[serde(default = "crate::config::defaults::default_next_up_policy")]
    pub next_up_policy: NextUpPolicy,
    #[serde(default = "crate::config::defaults::default_listen_gap_ms")]
    pub listen_gap_ms: u64,
    #[serde(default = "crate::config::defaults::default_repeat_pause_ms")]
    pub repeat_pause_ms: u64,
    #[serde(default = "crate::config::defaults::default_min_repeat_pause_ms")]
    pub min_repeat_pause_ms: u64,
    #[serde(default = "crate::config::defaults::default_repeat_covers_clip")]
    pub repeat_covers_clip: bool,
    #[serde(default = "crate::config::defaults::default_read_gap_factor")]
    pub read_gap_factor: f64,
    #[serde(default = "crate::config::defaults::default_min_read_gap_ms")]
    pub min_read_gap_ms: u64,
    #[serde(default = "crate::config::defaults::default_max_read_gap_ms")]
    pub max_read_gap_ms: u64,
    #[serde(default = "crate::config::defaults::default_between_group_gap_ms")]
    pub between_group_gap_ms: u64,
    #[serde(default = "crate::config::defaults::default_audio_volume")]
    pub audio_volume: f32,
    #[serde(default)]
    pub audio_root: Option<String>,
    #[serde(default = "crate::config::defaults::default_key_toggle_play_pause")]
    pub key_toggle_play_pause: String,
    #[serde(default = "crate::config::defaults::default_key_restart")]
    pub key_restart: String,
    #[serde(default = "crate::config::defaults::default_key_quit")]
    pub key_quit: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            default_mode: crate::config::defaults::default_mode(),
            next_up_policy: crate::config::defaults::default_next_up_policy(),
            listen_gap_ms: crate::config::defaults::default_listen_gap_ms(),
            repeat_pause_ms: crate::config::defaults::default_repeat_pause_ms(),
            min_repeat_pause_ms: crate::config::defaults::default_min_repeat_pause_ms(),
            repeat_covers_clip: crate::config::defaults::default_repeat_covers_clip(),
            read_gap_factor: crate::config::defaults::default_read_gap_factor(),
            min_read_gap_ms: crate::config::defaults::default_min_read_gap_ms(),
            max_read_gap_ms: crate::config::defaults::default_max_read_gap_ms(),
            between_group_gap_ms: crate::config::defaults::default_between_group_gap_ms(),
            audio_volume: crate::config::defaults::default_audio_volume(),
            audio_root: None,
            key_toggle_play_pause: crate::config::defaults::default_key_toggle_play_pause(),
            key_restart: crate::config::defaults::default_key_restart(),
            key_quit: crate::config::defaults::default_key_quit(),
        }
    }
}

impl AppConfig {
    pub fn gap_options(&self) -> GapOptions {
        GapOptions {
            listen_gap_ms: self.listen_gap_ms,
            repeat_pause_ms: self.repeat_pause_ms,
            min_repeat_pause_ms: self.min_repeat_pause_ms,
            repeat_covers_clip: self.repeat_covers_clip,
            read_gap_factor: self.read_gap_factor,
            min_read_gap_ms: self.min_read_gap_ms,
            max_read_gap_ms: self.max_read_gap_ms,
            between_group_gap_ms: self.between_group_gap_ms,
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
