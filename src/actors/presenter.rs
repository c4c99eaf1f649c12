//! Streaming Presenter
//!
//! Reveals an already complete answer one word per tick, independent of how
//! long the network took to produce it.

use crate::actors::messages::RevealEvent;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    tick: Duration,
}

/// Owns a running reveal. Dropping it does not stop the reveal; `cancel` does.
#[derive(Debug)]
pub struct RevealHandle {
    message_id: u64,
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    /// No further events are emitted after this returns.
    pub fn cancel(&self) {
        tracing::debug!("[Presenter] Cancelling reveal for message {}", self.message_id);
        self.task.abort();
    }
}

impl Presenter {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Emits one `Progress` per space-separated word and exactly one
    /// `Finished`. Every `visible` is a prefix of `full_text`, so line
    /// breaks and spacing inside the answer are kept.
    pub fn reveal(&self, full_text: &str, message_id: u64, sink: Sender<RevealEvent>) -> RevealHandle {
        let word_ends = word_ends(full_text);
        let full_text = full_text.to_string();
        let tick = self.tick;

        tracing::debug!(
            "[Presenter] Revealing {} tokens into message {}",
            word_ends.len(),
            message_id
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately
            ticker.tick().await;

            for end in word_ends {
                ticker.tick().await;

                let event = RevealEvent::Progress {
                    message_id,
                    visible: full_text[..end].to_string(),
                };
                if sink.send(event).await.is_err() {
                    tracing::debug!("[Presenter] Sink closed, abandoning message {}", message_id);
                    return;
                }
            }

            let _ = sink
                .send(RevealEvent::Finished {
                    message_id,
                    text: full_text,
                })
                .await;
        });

        RevealHandle { message_id, task }
    }
}

/// Byte offsets where each word split on `' '` ends.
fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = vec![];
    let mut offset = 0;
    for segment in text.split(' ') {
        offset += segment.len();
        if !segment.is_empty() {
            ends.push(offset);
        }
        offset += 1;
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::channel;

    async fn collect(text: &str) -> Vec<RevealEvent> {
        let (tx, mut rx) = channel(16);
        let presenter = Presenter::new(Duration::from_millis(1));
        let _handle = presenter.reveal(text, 7, tx);

        let mut events = vec![];
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_reveal_passes_through_each_prefix() {
        let events = collect("a b c").await;

        assert_eq!(
            events,
            vec![
                RevealEvent::Progress { message_id: 7, visible: "a".to_string() },
                RevealEvent::Progress { message_id: 7, visible: "a b".to_string() },
                RevealEvent::Progress { message_id: 7, visible: "a b c".to_string() },
                RevealEvent::Finished { message_id: 7, text: "a b c".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_line_breaks_survive_the_reveal() {
        let events = collect("Summary:\n\n- one\n- two").await;

        assert_eq!(
            events.first(),
            Some(&RevealEvent::Progress { message_id: 7, visible: "Summary:\n\n-".to_string() })
        );
        assert_eq!(
            events.last(),
            Some(&RevealEvent::Finished { message_id: 7, text: "Summary:\n\n- one\n- two".to_string() })
        );
    }

    #[tokio::test]
    async fn test_finished_text_is_the_full_answer() {
        let events = collect("two  spaces").await;

        assert_eq!(
            events,
            vec![
                RevealEvent::Progress { message_id: 7, visible: "two".to_string() },
                RevealEvent::Progress { message_id: 7, visible: "two  spaces".to_string() },
                RevealEvent::Finished { message_id: 7, text: "two  spaces".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_text_finishes_immediately() {
        let events = collect("").await;
        assert_eq!(
            events,
            vec![RevealEvent::Finished { message_id: 7, text: String::new() }]
        );

        let events = collect("   ").await;
        assert_eq!(
            events,
            vec![RevealEvent::Finished { message_id: 7, text: "   ".to_string() }]
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_events() {
        let (tx, mut rx) = channel(16);
        let presenter = Presenter::new(Duration::from_millis(50));
        let handle = presenter.reveal("one two three four five", 1, tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(first, RevealEvent::Progress { message_id: 1, visible: "one".to_string() });

        handle.cancel();

        // the aborted task drops its sender, closing the channel
        let mut finished = false;
        while let Some(event) = rx.recv().await {
            if matches!(event, RevealEvent::Finished { .. }) {
                finished = true;
            }
        }
        assert!(!finished);
        assert_eq!(handle.message_id(), 1);
    }
}
