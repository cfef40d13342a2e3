//! View merging
//!
//! Folds decoded stream events into an [`Accumulator`] and publishes
//! coalesced snapshots. Events arriving within one window produce a single
//! publish at the end of the window, carrying the values current at that
//! moment. Whatever is still unpublished when the event stream closes is
//! published immediately.

use super::state::SessionState;
use mason_core_types::StreamEvent;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub answer: String,
    pub reasoning: String,
}

impl Accumulator {
    pub fn apply(mut self, event: &StreamEvent) -> Self {
        if event.is_reasoning {
            self.reasoning.push_str(&event.text);
        } else {
            self.answer.push_str(&event.text);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.answer.is_empty() && self.reasoning.is_empty()
    }
}

pub trait SnapshotSink {
    fn publish(&mut self, snapshot: &Accumulator);
}

/// Writes snapshots onto the last turn of the session's conversation.
///
/// Empty fields do not overwrite what the turn already holds.
pub struct SessionSink<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> SessionSink<'a> {
    pub fn new(state: &'a watch::Sender<SessionState>) -> Self {
        Self { state }
    }
}

impl SnapshotSink for SessionSink<'_> {
    fn publish(&mut self, snapshot: &Accumulator) {
        self.state.send_modify(|state| {
            state.conversation = state.conversation.with_last_turn(|turn| {
                if !snapshot.answer.is_empty() {
                    turn.content = snapshot.answer.clone();
                }
                if !snapshot.reasoning.is_empty() {
                    turn.reasoning = Some(snapshot.reasoning.clone());
                }
            });
        });
    }
}

pub struct ViewMerger<S> {
    window: Duration,
    sink: S,
}

impl<S: SnapshotSink> ViewMerger<S> {
    pub fn new(window: Duration, sink: S) -> Self {
        Self { window, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes events until the channel closes and returns the final fold.
    pub async fn run(&mut self, mut rx: mpsc::UnboundedReceiver<StreamEvent>) -> Accumulator {
        let mut accumulator = Accumulator::default();
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.sink.publish(&accumulator);
                }
                event = rx.recv() => match event {
                    Some(event) => {
                        accumulator = accumulator.apply(&event);
                        deadline.get_or_insert_with(|| Instant::now() + self.window);
                    }
                    None => break,
                },
            }
        }

        if deadline.is_some() {
            self.sink.publish(&accumulator);
        }
        accumulator
    }
}
