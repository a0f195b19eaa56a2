//! Per-activity pacing: which mode, which gaps, and how "Next up..." behaves.

use crate::config::AppConfig;
use crate::gap::{GapOptions, PlaybackMode};
use serde::{Deserialize, Serialize};

/// Listen-mode activities disagree on whether the trailing gap and its
/// "Next up..." status apply after the final clip, so each profile picks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NextUpPolicy {
    /// Only pause and announce when more audio follows.
    #[default]
    WhenMoreRemain,
    /// Pause and announce after every segment, including the last.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceProfile {
    pub mode: PlaybackMode,
    pub gaps: GapOptions,
    pub next_up: NextUpPolicy,
}

impl SequenceProfile {
    pub fn listen(gaps: GapOptions) -> Self {
        Self {
            mode: PlaybackMode::Listen,
            gaps,
            next_up: NextUpPolicy::WhenMoreRemain,
        }
    }

    pub fn listen_repeat(gaps: GapOptions) -> Self {
        Self {
            mode: PlaybackMode::ListenRepeat,
            gaps,
            next_up: NextUpPolicy::WhenMoreRemain,
        }
    }

    pub fn read_along(gaps: GapOptions) -> Self {
        Self {
            mode: PlaybackMode::Read,
            gaps,
            next_up: NextUpPolicy::WhenMoreRemain,
        }
    }

    pub fn from_config(mode: PlaybackMode, config: &AppConfig) -> Self {
        Self {
            mode,
            gaps: config.gap_options(),
            next_up: config.next_up_policy,
        }
    }

    pub fn with_next_up(mut self, next_up: NextUpPolicy) -> Self {
        self.next_up = next_up;
        self
    }

    /// Whether the pause after a segment is taken at all.
    ///
    /// Listen pacing with `WhenMoreRemain` ends as soon as the final clip
    /// does; repeat and read-along always leave the learner their turn.
    pub(crate) fn waits_after(&self, more_remaining: bool) -> bool {
        match self.mode {
            PlaybackMode::Listen => more_remaining || self.next_up == NextUpPolicy::Always,
            PlaybackMode::ListenRepeat | PlaybackMode::Read => true,
        }
    }
}
