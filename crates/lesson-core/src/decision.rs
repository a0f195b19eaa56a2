//! Timed answer windows for quiz-style slides.
//!
//! Each question gets a scope nested under the slide's token, so leaving the
//! slide also closes whatever window is open.

use crate::cancellation::CancellationToken;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T> {
    Answered(T),
    TimedOut,
    Cancelled,
}

/// Wait up to `window` for the learner's answer.
///
/// A closed answer channel counts as `Cancelled`: nobody is left to answer.
pub async fn await_decision<T>(
    window: Duration,
    answers: &mut mpsc::Receiver<T>,
    slide: &CancellationToken,
) -> Decision<T> {
    let scope = slide.child_token();
    let decision = if scope.is_cancelled() {
        Decision::Cancelled
    } else {
        tokio::select! {
            biased;
            _ = scope.cancelled() => Decision::Cancelled,
            answer = answers.recv() => match answer {
                Some(answer) => Decision::Answered(answer),
                None => {
                    debug!("Answer channel closed during decision window");
                    Decision::Cancelled
                }
            },
            _ = tokio::time::sleep(window) => Decision::TimedOut,
        }
    };
    scope.cancel();
    decision
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub correct: u32,
    pub incorrect: u32,
    pub timed_out: u32,
}

impl ScoreCard {
    /// Count one finished question. Cancelled windows are not scored.
    pub fn record<T>(&mut self, decision: &Decision<T>, is_correct: impl FnOnce(&T) -> bool) {
        match decision {
            Decision::Answered(answer) if is_correct(answer) => self.correct += 1,
            Decision::Answered(_) => self.incorrect += 1,
            Decision::TimedOut => self.timed_out += 1,
            Decision::Cancelled => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.incorrect + self.timed_out
    }

    pub fn is_perfect(&self) -> bool {
        self.total() > 0 && self.correct == self.total()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("{}/{} correct", self.correct, self.total());
        if self.timed_out > 0 {
            summary.push_str(&format!(", {} timed out", self.timed_out));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, sleep};

    #[tokio::test(start_paused = true)]
    async fn answer_inside_window_wins() {
        let (tx, mut rx) = mpsc::channel(1);
        let slide = CancellationToken::new();
        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            let _ = tx.send("b").await;
        });

        let decision = await_decision(Duration::from_secs(5), &mut rx, &slide).await;
        assert_eq!(decision, Decision::Answered("b"));
        assert!(!slide.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn silence_times_out_after_window() {
        let (_tx, mut rx) = mpsc::channel::<u8>(1);
        let slide = CancellationToken::new();
        let started = Instant::now();

        let decision = await_decision(Duration::from_millis(2000), &mut rx, &slide).await;
        assert_eq!(decision, Decision::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_the_slide_cancels_the_window() {
        let (_tx, mut rx) = mpsc::channel::<u8>(1);
        let slide = CancellationToken::new();
        let leaver = slide.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            leaver.cancel();
        });

        let started = Instant::now();
        let decision = await_decision(Duration::from_secs(10), &mut rx, &slide).await;
        assert_eq!(decision, Decision::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn already_left_slide_returns_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(1u8).await.expect("send should succeed");
        let slide = CancellationToken::new();
        slide.cancel();

        let decision = await_decision(Duration::from_secs(10), &mut rx, &slide).await;
        assert_eq!(decision, Decision::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_answer_channel_is_cancelled() {
        let (tx, mut rx) = mpsc::channel::<u8>(1);
        drop(tx);
        let slide = CancellationToken::new();
        let decision = await_decision(Duration::from_secs(10), &mut rx, &slide).await;
        assert_eq!(decision, Decision::Cancelled);
    }

    #[test]
    fn score_card_tallies_and_summarizes() {
        let mut card = ScoreCard::default();
        let correct = |answer: &&str| *answer == "der";
        card.record(&Decision::Answered("der"), correct);
        card.record(&Decision::Answered("die"), correct);
        card.record(&Decision::<&str>::TimedOut, correct);
        card.record(&Decision::<&str>::Cancelled, correct);

        assert_eq!(card.total(), 3);
        assert!(!card.is_perfect());
        assert_eq!(card.summary(), "1/3 correct, 1 timed out");
    }

    #[test]
    fn empty_card_is_not_perfect() {
        let mut card = ScoreCard::default();
        assert!(!card.is_perfect());
        card.record(&Decision::Answered(true), |ok| *ok);
        assert!(card.is_perfect());
        assert_eq!(card.summary(), "1/1 correct");
    }
}
