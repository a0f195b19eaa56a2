//! Playback sequencer shared by every audio-driven activity.
//!
//! A slide owns one `Sequencer`. Commands (`start`, `pause`, `resume`,
//! `toggle`, `leave`) are synchronous and may come from any thread; each
//! start or resume spawns one run task on the ambient tokio runtime. Runs
//! carry a request id so a run that was replaced never touches state when
//! it unwinds.
//!
//! Views are invoked while the state lock is held and must not call back
//! into the sequencer.

use crate::audio::AudioManager;
use crate::cancellation::CancellationToken;
use crate::content::Entry;
use crate::gap::{PlaybackMode, between_item_gap_ms, compute_segment_gap_ms};
use crate::profile::SequenceProfile;
use crate::view::{ControlsView, HighlightState, PlaybackView, status};
use crate::wait::{WaitOutcome, wait_ms};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ts_rs::TS;

pub type RunHandle = JoinHandle<RunOutcome>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Paused { resume_index: usize },
    /// The slide was left while this run was active.
    Stopped,
    /// A newer run replaced this one.
    Superseded,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub mode: PlaybackMode,
    pub resume_index: usize,
    pub current_index: Option<usize>,
    pub entry_count: usize,
    pub status: String,
    pub controls: ControlsView,
}

#[derive(Debug, Default)]
struct Shared {
    state: PlaybackState,
    resume_index: usize,
    current_index: Option<usize>,
    request_id: u64,
    cancel_token: Option<CancellationToken>,
    pause_requested: bool,
    status: String,
}

impl Shared {
    fn is_live(&self, request_id: u64) -> bool {
        self.request_id == request_id
            && self.state == PlaybackState::Playing
            && !self.pause_requested
    }
}

enum RunStart {
    Beginning,
    Resume,
}

#[derive(Clone)]
pub struct Sequencer {
    entries: Arc<[Entry]>,
    profile: SequenceProfile,
    audio: Arc<dyn AudioManager>,
    view: Arc<dyn PlaybackView>,
    shared: Arc<Mutex<Shared>>,
}

impl Sequencer {
    pub fn new(
        entries: Vec<Entry>,
        profile: SequenceProfile,
        audio: Arc<dyn AudioManager>,
        view: Arc<dyn PlaybackView>,
    ) -> Self {
        let sequencer = Self {
            entries: entries.into(),
            profile,
            audio,
            view,
            shared: Arc::new(Mutex::new(Shared::default())),
        };
        sequencer
            .view
            .controls(&sequencer.controls_for(PlaybackState::Idle));
        sequencer
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn profile(&self) -> &SequenceProfile {
        &self.profile
    }

    pub fn state(&self) -> PlaybackState {
        self.lock_shared().state
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let shared = self.lock_shared();
        PlaybackSnapshot {
            state: shared.state,
            mode: self.profile.mode,
            resume_index: shared.resume_index,
            current_index: shared.current_index,
            entry_count: self.entries.len(),
            status: shared.status.clone(),
            controls: self.controls_for(shared.state),
        }
    }

    /// Play from the first entry, replacing any run in flight.
    pub fn start(&self) -> Option<RunHandle> {
        if self.entries.is_empty() {
            let mut shared = self.lock_shared();
            shared.state = PlaybackState::Idle;
            shared.resume_index = 0;
            shared.current_index = None;
            self.set_status(&mut shared, status::CONTENT_UNAVAILABLE);
            self.view.controls(&self.controls_for(PlaybackState::Idle));
            warn!(mode = %self.profile.mode, "No playable entries; playback not started");
            return None;
        }
        self.begin_run(RunStart::Beginning)
    }

    /// Ask the active run to stop and remember where it was.
    pub fn pause(&self) -> bool {
        let mut shared = self.lock_shared();
        if shared.state != PlaybackState::Playing || shared.pause_requested {
            debug!(state = ?shared.state, "Ignoring pause outside of playback");
            return false;
        }
        shared.pause_requested = true;
        if let Some(token) = &shared.cancel_token {
            token.cancel();
        }
        info!(
            current_index = ?shared.current_index,
            request_id = shared.request_id,
            "Pause requested"
        );
        true
    }

    /// Restart from the first segment of the entry recorded at pause.
    pub fn resume(&self) -> Option<RunHandle> {
        self.begin_run(RunStart::Resume)
    }

    /// Single play/pause button.
    pub fn toggle(&self) -> Option<RunHandle> {
        match self.state() {
            PlaybackState::Idle => self.start(),
            PlaybackState::Playing => {
                self.pause();
                None
            }
            PlaybackState::Paused => self.resume(),
        }
    }

    /// Slide teardown: stop everything and forget the resume position.
    pub fn leave(&self) {
        let mut shared = self.lock_shared();
        if let Some(token) = shared.cancel_token.take() {
            token.cancel();
        }
        let previous = shared.state;
        shared.state = PlaybackState::Idle;
        shared.resume_index = 0;
        shared.current_index = None;
        shared.pause_requested = false;
        self.audio.stop_all();
        self.view.clear_highlights();
        self.set_status(&mut shared, "");
        self.view.controls(&self.controls_for(PlaybackState::Idle));
        info!(previous = ?previous, "Left slide; playback reset");
    }

    fn begin_run(&self, from: RunStart) -> Option<RunHandle> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Playback requested outside of a tokio runtime");
            return None;
        };

        let (start_index, request_id, cancel) = {
            let mut shared = self.lock_shared();
            let start_index = match from {
                RunStart::Beginning => 0,
                RunStart::Resume => {
                    if shared.state != PlaybackState::Paused {
                        debug!(state = ?shared.state, "Ignoring resume while not paused");
                        return None;
                    }
                    shared.resume_index.min(self.entries.len())
                }
            };

            if let Some(previous) = shared.cancel_token.take() {
                previous.cancel();
            }
            shared.request_id = shared.request_id.wrapping_add(1);
            let cancel = CancellationToken::new();
            shared.cancel_token = Some(cancel.clone());
            shared.state = PlaybackState::Playing;
            shared.pause_requested = false;
            shared.resume_index = start_index;
            shared.current_index = None;

            self.audio.stop_all();
            self.view.clear_highlights();
            self.view.controls(&self.controls_for(PlaybackState::Playing));
            (start_index, shared.request_id, cancel)
        };

        info!(
            start_index,
            request_id,
            entries = self.entries.len(),
            mode = %self.profile.mode,
            "Starting playback run"
        );
        let sequencer = self.clone();
        Some(runtime.spawn(async move { sequencer.run(start_index, request_id, cancel).await }))
    }

    async fn run(self, start_index: usize, request_id: u64, cancel: CancellationToken) -> RunOutcome {
        let total = self.entries.len();
        let mode = self.profile.mode;

        for entry_idx in start_index..total {
            let entry = &self.entries[entry_idx];
            if cancel.is_cancelled() || !self.enter_entry(request_id, entry_idx) {
                return self.finish_aborted(request_id, entry_idx);
            }

            let segment_count = entry.segments.len();
            for (segment_idx, segment) in entry.segments.iter().enumerate() {
                let last_segment = segment_idx + 1 == segment_count;
                let more_remaining = !last_segment || entry_idx + 1 < total;
                let url = segment.audio_url.as_str();

                self.emit_live(request_id, |shared| {
                    self.view
                        .highlight(entry_idx, segment_idx, HighlightState::Playing);
                    self.set_status(shared, status::PLAYING);
                });
                debug!(entry = entry_idx, segment = segment_idx, url, "Playing segment");

                match self.audio.play(url, &cancel).await {
                    Ok(()) => {}
                    Err(err) if err.is_abort() || cancel.is_cancelled() => {
                        return self.finish_aborted(request_id, entry_idx);
                    }
                    Err(err) => {
                        warn!(
                            entry = entry_idx,
                            segment = segment_idx,
                            url,
                            "Segment playback failed: {err}"
                        );
                        self.emit_live(request_id, |shared| {
                            self.view
                                .highlight(entry_idx, segment_idx, HighlightState::Cleared);
                            self.set_status(shared, status::PLAYBACK_FAILED);
                        });
                        continue;
                    }
                }

                if !self.profile.waits_after(more_remaining) {
                    self.emit_live(request_id, |_| {
                        self.view
                            .highlight(entry_idx, segment_idx, HighlightState::Active);
                    });
                    continue;
                }

                let duration_secs = match self.audio.duration_secs(url).await {
                    Ok(secs) => secs,
                    Err(err) => {
                        debug!(url, "Clip duration unavailable: {err}");
                        f64::NAN
                    }
                };
                let mut gap_ms = compute_segment_gap_ms(mode, duration_secs, &self.profile.gaps);
                if last_segment && entry_idx + 1 < total {
                    gap_ms = gap_ms.saturating_add(between_item_gap_ms(mode, &self.profile.gaps));
                }
                debug!(
                    entry = entry_idx,
                    segment = segment_idx,
                    duration_secs,
                    gap_ms,
                    "Waiting after segment"
                );

                self.emit_live(request_id, |shared| {
                    self.set_status(shared, gap_status(mode));
                });
                if wait_ms(gap_ms as f64, &cancel).await == WaitOutcome::Cancelled {
                    // Once the final segment has been heard the entry is done.
                    let resume_at = if last_segment { entry_idx + 1 } else { entry_idx };
                    return self.finish_aborted(request_id, resume_at);
                }

                self.emit_live(request_id, |_| {
                    self.view
                        .highlight(entry_idx, segment_idx, HighlightState::Active);
                });
            }

            self.emit_live(request_id, |_| {
                for segment_idx in 0..segment_count {
                    self.view
                        .highlight(entry_idx, segment_idx, HighlightState::Cleared);
                }
            });
        }

        self.finish_completed(request_id, &cancel)
    }

    fn enter_entry(&self, request_id: u64, entry_idx: usize) -> bool {
        let mut shared = self.lock_shared();
        if !shared.is_live(request_id) {
            return false;
        }
        shared.current_index = Some(entry_idx);
        true
    }

    /// Apply `update` only while `request_id` is the live, unpaused run.
    fn emit_live(&self, request_id: u64, update: impl FnOnce(&mut Shared)) {
        let mut shared = self.lock_shared();
        if shared.is_live(request_id) {
            update(&mut *shared);
        }
    }

    fn finish_aborted(&self, request_id: u64, resume_index: usize) -> RunOutcome {
        let mut shared = self.lock_shared();
        if shared.request_id != request_id {
            debug!(
                request_id,
                current = shared.request_id,
                "Ignoring stale playback run"
            );
            return RunOutcome::Superseded;
        }
        if shared.state != PlaybackState::Playing {
            debug!(request_id, "Playback run stopped by slide leave");
            return RunOutcome::Stopped;
        }

        // Either a user pause or audio interrupted from outside; both keep
        // the position so the learner can continue.
        let resume_index = resume_index.min(self.entries.len());
        if !shared.pause_requested {
            warn!(request_id, resume_index, "Playback interrupted externally; holding position");
        }
        shared.state = PlaybackState::Paused;
        shared.pause_requested = false;
        shared.cancel_token = None;
        shared.resume_index = resume_index;
        shared.current_index = (resume_index < self.entries.len()).then_some(resume_index);

        self.view.clear_highlights();
        if shared.current_index.is_some() {
            self.view.highlight(resume_index, 0, HighlightState::Active);
        }
        self.set_status(&mut shared, status::PAUSED);
        self.view.controls(&self.controls_for(PlaybackState::Paused));
        info!(request_id, resume_index, "Playback paused");
        RunOutcome::Paused { resume_index }
    }

    fn finish_completed(&self, request_id: u64, cancel: &CancellationToken) -> RunOutcome {
        if cancel.is_cancelled() {
            return self.finish_aborted(request_id, self.entries.len());
        }

        let mut shared = self.lock_shared();
        if shared.request_id != request_id {
            return RunOutcome::Superseded;
        }
        if shared.state != PlaybackState::Playing {
            return RunOutcome::Stopped;
        }

        shared.state = PlaybackState::Idle;
        shared.resume_index = self.entries.len();
        shared.current_index = None;
        shared.cancel_token = None;
        shared.pause_requested = false;

        self.view.clear_highlights();
        self.set_status(&mut shared, status::COMPLETE);
        self.view.controls(&self.controls_for(PlaybackState::Idle));
        self.view.completed();
        info!(request_id, entries = self.entries.len(), "Playback complete");
        RunOutcome::Completed
    }

    fn set_status(&self, shared: &mut Shared, text: &str) {
        shared.status = text.to_string();
        self.view.status(text);
    }

    fn controls_for(&self, state: PlaybackState) -> ControlsView {
        match state {
            PlaybackState::Idle => ControlsView::new("Play", !self.entries.is_empty()),
            PlaybackState::Playing => ControlsView::new("Pause", true),
            PlaybackState::Paused => ControlsView::new("Resume", true),
        }
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn gap_status(mode: PlaybackMode) -> &'static str {
    match mode {
        PlaybackMode::ListenRepeat => status::YOUR_TURN,
        PlaybackMode::Read => status::READ_ALONG,
        PlaybackMode::Listen => status::NEXT_UP,
    }
}
