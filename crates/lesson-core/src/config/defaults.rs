use crate::gap::PlaybackMode;
use crate::profile::NextUpPolicy;

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) fn default_mode() -> PlaybackMode {
    PlaybackMode::Listen
}

pub(crate) fn default_next_up_policy() -> NextUpPolicy {
    NextUpPolicy::WhenMoreRemain
}

pub(crate) fn default_listen_gap_ms() -> u64 {
    600
}

pub(crate) fn default_repeat_pause_ms() -> u64 {
    1500
}

pub(crate) fn default_min_repeat_pause_ms() -> u64 {
    1000
}

pub(crate) fn default_read_gap_factor() -> f64 {
    0.5
}

pub(crate) fn default_repeat_covers_clip() -> bool {
    true
}

pub(crate) fn default_min_read_gap_ms() -> u64 {
    400
}

pub(crate) fn default_max_read_gap_ms() -> u64 {
    4000
}

pub(crate) fn default_between_group_gap_ms() -> u64 {
    1000
}

pub(crate) fn default_audio_volume() -> f32 {
    1.0
}

pub(crate) fn default_key_toggle_play_pause() -> String {
    "p".to_string()
}

pub(crate) fn default_key_restart() -> String {
    "s".to_string()
}

pub(crate) fn default_key_quit() -> String {
    "q".to_string()
}
