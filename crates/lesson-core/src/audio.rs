//! Audio output seam used by the sequencer.
//!
//! One manager is constructed per process and handed to every slide as an
//! `Arc<dyn AudioManager>`.

use crate::cancellation::CancellationToken;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// Playback was interrupted through its cancellation token or `stop_all`.
    #[error("playback aborted")]
    Aborted,
    #[error("failed to load audio {url}: {reason}")]
    Load { url: String, reason: String },
    #[error("failed to play audio {url}: {reason}")]
    Playback { url: String, reason: String },
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
}

impl AudioError {
    pub fn is_abort(&self) -> bool {
        matches!(self, AudioError::Aborted)
    }
}

#[async_trait]
pub trait AudioManager: Send + Sync {
    /// Play `url` to completion. Resolves with `Aborted` as soon as `cancel`
    /// fires.
    async fn play(&self, url: &str, cancel: &CancellationToken) -> Result<(), AudioError>;

    /// Length of the clip in seconds.
    async fn duration_secs(&self, url: &str) -> Result<f64, AudioError>;

    /// Silence every stream this manager owns.
    fn stop_all(&self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory manager whose clips "play" by sleeping on the tokio clock.
    pub(crate) struct ScriptedAudio {
        clip_len: Duration,
        durations: HashMap<String, f64>,
        failing: HashSet<String>,
        played: Mutex<Vec<String>>,
        finished: Mutex<Vec<String>>,
        stop_calls: AtomicUsize,
        /// Replaced on every `stop_all`; in-flight clips listen on the old one.
        stop_signal: Mutex<CancellationToken>,
    }

    impl ScriptedAudio {
        pub(crate) fn new(clip_len: Duration) -> Self {
            Self {
                clip_len,
                durations: HashMap::new(),
                failing: HashSet::new(),
                played: Mutex::new(Vec::new()),
                finished: Mutex::new(Vec::new()),
                stop_calls: AtomicUsize::new(0),
                stop_signal: Mutex::new(CancellationToken::new()),
            }
        }

        pub(crate) fn with_duration(mut self, url: &str, secs: f64) -> Self {
            self.durations.insert(url.to_string(), secs);
            self
        }

        pub(crate) fn failing(mut self, url: &str) -> Self {
            self.failing.insert(url.to_string());
            self
        }

        /// Every `play` call, in order, including interrupted ones.
        pub(crate) fn played(&self) -> Vec<String> {
            self.played.lock().expect("played lock").clone()
        }

        /// Clips that played through to the end.
        pub(crate) fn finished(&self) -> Vec<String> {
            self.finished.lock().expect("finished lock").clone()
        }

        pub(crate) fn stop_calls(&self) -> usize {
            self.stop_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioManager for ScriptedAudio {
        async fn play(&self, url: &str, cancel: &CancellationToken) -> Result<(), AudioError> {
            self.played.lock().expect("played lock").push(url.to_string());
            if cancel.is_cancelled() {
                return Err(AudioError::Aborted);
            }
            if self.failing.contains(url) {
                return Err(AudioError::Load {
                    url: url.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            let stopped = self.stop_signal.lock().expect("stop lock").clone();
            tokio::select! {
                _ = tokio::time::sleep(self.clip_len) => {
                    self.finished.lock().expect("finished lock").push(url.to_string());
                    Ok(())
                }
                _ = cancel.cancelled() => Err(AudioError::Aborted),
                _ = stopped.cancelled() => Err(AudioError::Aborted),
            }
        }

        async fn duration_secs(&self, url: &str) -> Result<f64, AudioError> {
            Ok(self
                .durations
                .get(url)
                .copied()
                .unwrap_or(self.clip_len.as_secs_f64()))
        }

        fn stop_all(&self) {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            let mut signal = self.stop_signal.lock().expect("stop lock");
            signal.cancel();
            *signal = CancellationToken::new();
        }
    }
}
