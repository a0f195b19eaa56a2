//! What the sequencer tells the presentation layer.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use ts_rs::TS;

pub mod status {
    pub const PLAYING: &str = "Playing...";
    pub const YOUR_TURN: &str = "Your turn...";
    pub const READ_ALONG: &str = "Read along...";
    pub const NEXT_UP: &str = "Next up...";
    pub const PAUSED: &str = "Paused.";
    pub const COMPLETE: &str = "Playback complete.";
    pub const PLAYBACK_FAILED: &str = "Unable to play audio.";
    pub const CONTENT_UNAVAILABLE: &str = "Content not available.";
}

/// Highlight applied to one segment's display element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum HighlightState {
    /// Audio for this segment is playing right now.
    Playing,
    /// Current entry, but nothing audible.
    Active,
    Cleared,
}

/// Play/pause button state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct ControlsView {
    pub label: String,
    pub enabled: bool,
}

impl ControlsView {
    pub fn new(label: &str, enabled: bool) -> Self {
        Self {
            label: label.to_string(),
            enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ViewEvent {
    Status {
        text: String,
    },
    Highlight {
        entry: usize,
        segment: usize,
        state: HighlightState,
    },
    ClearHighlights,
    Controls {
        controls: ControlsView,
    },
    Completed,
}

pub trait PlaybackView: Send + Sync {
    fn status(&self, text: &str);
    fn highlight(&self, entry: usize, segment: usize, state: HighlightState);
    fn clear_highlights(&self);
    fn controls(&self, controls: &ControlsView);
    /// Hook for the completion collaborator; runs once per finished sequence.
    fn completed(&self) {}
}

/// Forwards every callback as a `ViewEvent` to whoever renders the slide.
#[derive(Debug, Clone)]
pub struct ChannelView {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl ChannelView {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: ViewEvent) {
        // Receiver gone means the slide is already torn down.
        let _ = self.tx.send(event);
    }
}

impl PlaybackView for ChannelView {
    fn status(&self, text: &str) {
        self.emit(ViewEvent::Status {
            text: text.to_string(),
        });
    }

    fn highlight(&self, entry: usize, segment: usize, state: HighlightState) {
        self.emit(ViewEvent::Highlight {
            entry,
            segment,
            state,
        });
    }

    fn clear_highlights(&self) {
        self.emit(ViewEvent::ClearHighlights);
    }

    fn controls(&self, controls: &ControlsView) {
        self.emit(ViewEvent::Controls {
            controls: controls.clone(),
        });
    }

    fn completed(&self) {
        self.emit(ViewEvent::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_view_forwards_events_in_order() {
        let (view, mut rx) = ChannelView::new();
        view.status(status::PLAYING);
        view.highlight(1, 0, HighlightState::Playing);
        view.clear_highlights();

        assert_eq!(
            rx.try_recv().ok(),
            Some(ViewEvent::Status {
                text: "Playing...".to_string()
            })
        );
        assert_eq!(
            rx.try_recv().ok(),
            Some(ViewEvent::Highlight {
                entry: 1,
                segment: 0,
                state: HighlightState::Playing
            })
        );
        assert_eq!(rx.try_recv().ok(), Some(ViewEvent::ClearHighlights));
    }

    #[test]
    fn view_events_serialize_with_kind_tag() {
        let json = serde_json::to_string(&ViewEvent::Highlight {
            entry: 2,
            segment: 1,
            state: HighlightState::Active,
        })
        .expect("event should serialize");
        assert_eq!(
            json,
            r#"{"kind":"highlight","entry":2,"segment":1,"state":"active"}"#
        );
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let (view, rx) = ChannelView::new();
        drop(rx);
        view.status(status::PAUSED);
        view.completed();
    }
}
