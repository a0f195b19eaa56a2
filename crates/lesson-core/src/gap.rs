//! Pause lengths inserted after a clip finishes, before the next action.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How an activity paces its audio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum PlaybackMode {
    /// Plain listening with a short breather between items.
    #[default]
    Listen,
    /// Learner repeats each clip aloud during the gap.
    ListenRepeat,
    /// Read-along pacing derived from clip length.
    Read,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlaybackMode::Listen => "listen",
            PlaybackMode::ListenRepeat => "listen-repeat",
            PlaybackMode::Read => "read",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for PlaybackMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "listen" => Ok(PlaybackMode::Listen),
            "listen-repeat" | "listen_repeat" | "repeat" => Ok(PlaybackMode::ListenRepeat),
            "read" | "read-along" => Ok(PlaybackMode::Read),
            other => Err(format!("unknown playback mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapOptions {
    pub listen_gap_ms: u64,
    pub repeat_pause_ms: u64,
    pub min_repeat_pause_ms: u64,
    /// Stretch the listen-repeat pause to at least the clip's own length.
    pub repeat_covers_clip: bool,
    pub read_gap_factor: f64,
    pub min_read_gap_ms: u64,
    pub max_read_gap_ms: u64,
    pub between_group_gap_ms: u64,
}

impl Default for GapOptions {
    fn default() -> Self {
        crate::config::AppConfig::default().gap_options()
    }
}

impl GapOptions {
    pub fn with_repeat_pause_ms(mut self, repeat_pause_ms: u64) -> Self {
        self.repeat_pause_ms = repeat_pause_ms;
        self
    }
}

/// Gap after a segment of `duration_secs` has finished playing.
///
/// - `Listen`: `listen_gap_ms`.
/// - `ListenRepeat`: `repeat_pause_ms` raised to `min_repeat_pause_ms`; with
///   `repeat_covers_clip` set, also raised to the clip length so the learner
///   has as long to repeat as the clip took.
/// - `Read`: clip length times `read_gap_factor`, clamped to
///   `[min_read_gap_ms, max_read_gap_ms]`.
///
/// Only the duration-derived part fails closed: an unknown, non-finite or
/// non-positive duration contributes nothing. Float-to-int conversions
/// saturate, so oversized durations or factors cannot overflow.
pub fn compute_segment_gap_ms(mode: PlaybackMode, duration_secs: f64, options: &GapOptions) -> u64 {
    let clip_ms = clip_millis(duration_secs);
    match mode {
        PlaybackMode::Listen => options.listen_gap_ms,
        PlaybackMode::ListenRepeat => {
            let floor = options.repeat_pause_ms.max(options.min_repeat_pause_ms);
            if options.repeat_covers_clip {
                floor.max(clip_ms.round() as u64)
            } else {
                floor
            }
        }
        PlaybackMode::Read => {
            if clip_ms <= 0.0 {
                return 0;
            }
            let factor = if options.read_gap_factor.is_finite() {
                options.read_gap_factor.max(0.0)
            } else {
                0.0
            };
            let scaled = (clip_ms * factor).round() as u64;
            let max = options.max_read_gap_ms.max(options.min_read_gap_ms);
            scaled.clamp(options.min_read_gap_ms, max)
        }
    }
}

/// Extra pause between entries (groups); only read-along pacing uses one.
pub fn between_item_gap_ms(mode: PlaybackMode, options: &GapOptions) -> u64 {
    match mode {
        PlaybackMode::Read => options.between_group_gap_ms,
        PlaybackMode::Listen | PlaybackMode::ListenRepeat => 0,
    }
}

fn clip_millis(duration_secs: f64) -> f64 {
    if duration_secs.is_finite() && duration_secs > 0.0 {
        duration_secs * 1000.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_gap_is_fixed() {
        let options = GapOptions::default();
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::Listen, 0.4, &options),
            options.listen_gap_ms
        );
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::Listen, 12.0, &options),
            options.listen_gap_ms
        );
    }

    #[test]
    fn listen_repeat_never_drops_below_clamped_minimum() {
        let options = GapOptions::default().with_repeat_pause_ms(2000);
        for duration in [f64::NAN, -1.0, 0.0, 0.25, 1.9, f64::INFINITY] {
            let gap = compute_segment_gap_ms(PlaybackMode::ListenRepeat, duration, &options);
            assert!(gap >= 2000, "duration {duration} produced {gap}");
        }
    }

    #[test]
    fn listen_repeat_clamps_tiny_pause_up_to_minimum() {
        let options = GapOptions::default().with_repeat_pause_ms(10);
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::ListenRepeat, 0.5, &options),
            options.min_repeat_pause_ms
        );
    }

    #[test]
    fn listen_repeat_gives_long_clips_their_own_length() {
        let options = GapOptions::default().with_repeat_pause_ms(1500);
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::ListenRepeat, 3.2, &options),
            3200
        );
    }

    #[test]
    fn listen_repeat_without_clip_cover_is_exactly_the_clamped_pause() {
        let options = GapOptions {
            repeat_covers_clip: false,
            ..GapOptions::default().with_repeat_pause_ms(1500)
        };
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::ListenRepeat, 3.2, &options),
            1500
        );
    }

    #[test]
    fn huge_durations_and_factors_saturate() {
        let options = GapOptions {
            read_gap_factor: f64::MAX,
            max_read_gap_ms: u64::MAX,
            ..GapOptions::default()
        };
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::Read, 1.0e300, &options),
            u64::MAX
        );
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::ListenRepeat, 1.0e300, &GapOptions::default()),
            u64::MAX
        );
    }

    #[test]
    fn read_gap_scales_with_duration_within_bounds() {
        let options = GapOptions::default();
        assert_eq!(compute_segment_gap_ms(PlaybackMode::Read, 2.0, &options), 1000);
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::Read, 0.1, &options),
            options.min_read_gap_ms
        );
        assert_eq!(
            compute_segment_gap_ms(PlaybackMode::Read, 60.0, &options),
            options.max_read_gap_ms
        );
    }

    #[test]
    fn read_gap_fails_closed_without_duration() {
        let options = GapOptions::default();
        assert_eq!(compute_segment_gap_ms(PlaybackMode::Read, f64::NAN, &options), 0);
        assert_eq!(compute_segment_gap_ms(PlaybackMode::Read, 0.0, &options), 0);
    }

    #[test]
    fn only_read_mode_has_between_item_gap() {
        let options = GapOptions::default();
        assert_eq!(
            between_item_gap_ms(PlaybackMode::Read, &options),
            options.between_group_gap_ms
        );
        assert_eq!(between_item_gap_ms(PlaybackMode::Listen, &options), 0);
        assert_eq!(between_item_gap_ms(PlaybackMode::ListenRepeat, &options), 0);
    }

    #[test]
    fn parses_mode_labels() {
        assert_eq!("Listen-Repeat".parse::<PlaybackMode>(), Ok(PlaybackMode::ListenRepeat));
        assert_eq!("read".parse::<PlaybackMode>(), Ok(PlaybackMode::Read));
        assert!("karaoke".parse::<PlaybackMode>().is_err());
    }
}
