use super::defaults;
use super::models::{AppConfig, LogLevel};
use crate::gap::PlaybackMode;
use crate::profile::NextUpPolicy;
use serde::Deserialize;

/// Sectioned layout of `conf/config.toml`.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    gaps: GapsConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    keys: KeysConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            default_mode: tables.playback.default_mode,
            next_up_policy: tables.playback.next_up_policy,
            listen_gap_ms: tables.gaps.listen_gap_ms,
            repeat_pause_ms: tables.gaps.repeat_pause_ms,
            min_repeat_pause_ms: tables.gaps.min_repeat_pause_ms,
            repeat_covers_clip: tables.gaps.repeat_covers_clip,
            read_gap_factor: tables.gaps.read_gap_factor,
            min_read_gap_ms: tables.gaps.min_read_gap_ms,
            max_read_gap_ms: tables.gaps.max_read_gap_ms,
            between_group_gap_ms: tables.gaps.between_group_gap_ms,
            audio_volume: tables.audio.volume,
            audio_root: tables.audio.audio_root,
            key_toggle_play_pause: tables.keys.toggle_play_pause,
            key_restart: tables.keys.restart,
            key_quit: tables.keys.quit,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            playback: PlaybackConfig {
                default_mode: config.default_mode,
                next_up_policy: config.next_up_policy,
            },
            gaps: GapsConfig {
                listen_gap_ms: config.listen_gap_ms,
                repeat_pause_ms: config.repeat_pause_ms,
                min_repeat_pause_ms: config.min_repeat_pause_ms,
                repeat_covers_clip: config.repeat_covers_clip,
                read_gap_factor: config.read_gap_factor,
                min_read_gap_ms: config.min_read_gap_ms,
                max_read_gap_ms: config.max_read_gap_ms,
                between_group_gap_ms: config.between_group_gap_ms,
            },
            audio: AudioConfig {
                volume: config.audio_volume,
                audio_root: config.audio_root.clone(),
            },
            keys: KeysConfig {
                toggle_play_pause: config.key_toggle_play_pause.clone(),
                restart: config.key_restart.clone(),
                quit: config.key_quit.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_mode")]
    default_mode: PlaybackMode,
    #[serde(default = "defaults::default_next_up_policy")]
    next_up_policy: NextUpPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_mode: defaults::default_mode(),
            next_up_policy: defaults::default_next_up_policy(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct GapsConfig {
    #[serde(default = "defaults::default_listen_gap_ms")]
    listen_gap_ms: u64,
    #[serde(default = "defaults::default_repeat_pause_ms")]
    repeat_pause_ms: u64,
    #[serde(default = "defaults::default_min_repeat_pause_ms")]
    min_repeat_pause_ms: u64,
    #[serde(default = "defaults::default_repeat_covers_clip")]
    repeat_covers_clip: bool,
    #[serde(default = "defaults::default_read_gap_factor")]
    read_gap_factor: f64,
    #[serde(default = "defaults::default_min_read_gap_ms")]
    min_read_gap_ms: u64,
    #[serde(default = "defaults::default_max_read_gap_ms")]
    max_read_gap_ms: u64,
    #[serde(default = "defaults::default_between_group_gap_ms")]
    between_group_gap_ms: u64,
}

impl Default for GapsConfig {
    fn default() -> Self {
        Self {
            listen_gap_ms: defaults::default_listen_gap_ms(),
            repeat_pause_ms: defaults::default_repeat_pause_ms(),
            min_repeat_pause_ms: defaults::default_min_repeat_pause_ms(),
            repeat_covers_clip: defaults::default_repeat_covers_clip(),
            read_gap_factor: defaults::default_read_gap_factor(),
            min_read_gap_ms: defaults::default_min_read_gap_ms(),
            max_read_gap_ms: defaults::default_max_read_gap_ms(),
            between_group_gap_ms: defaults::default_between_group_gap_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AudioConfig {
    #[serde(default = "defaults::default_audio_volume")]
    volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_root: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: defaults::default_audio_volume(),
            audio_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_play_pause")]
    toggle_play_pause: String,
    #[serde(default = "defaults::default_key_restart")]
    restart: String,
    #[serde(default = "defaults::default_key_quit")]
    quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            toggle_play_pause: defaults::default_key_toggle_play_pause(),
            restart: defaults::default_key_restart(),
            quit: defaults::default_key_quit(),
        }
    }
}
