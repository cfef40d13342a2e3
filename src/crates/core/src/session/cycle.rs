//! Request/response cycle
//!
//! One submission at a time: the session appends the user turn and an empty
//! assistant placeholder, sends the history, attaches citations, then streams
//! the body through the decoder and the view merger into the placeholder.

use super::citations::parse_results_header;
use super::conversation::Conversation;
use super::merger::{SessionSink, ViewMerger};
use super::state::{SessionState, SubmitOutcome};
use crate::config::MasonConfig;
use crate::transport::{ChatResponse, ChatTransport};
use crate::util::errors::{MasonError, MasonResult};
use log::{debug, error};
use mason_ai_adapters::{handle_chat_stream, handle_error_body, is_json_content_type};
use mason_core_types::{ChatRequest, ConversationTurn, FAILURE_MESSAGE};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub struct ChatSession<T> {
    transport: T,
    state: watch::Sender<SessionState>,
    coalesce_window: Duration,
    idle_timeout: Duration,
}

/// Clears the in-flight flags when a cycle ends, on every path.
struct PendingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| {
            state.loading = false;
            state.searching = false;
        });
    }
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, config: &MasonConfig) -> Self {
        Self::with_timing(
            transport,
            config.coalesce_window(),
            config.idle_timeout(),
            config.network,
        )
    }

    pub fn with_timing(
        transport: T,
        coalesce_window: Duration,
        idle_timeout: Duration,
        network: bool,
    ) -> Self {
        let (state, _) = watch::channel(SessionState {
            network,
            ..Default::default()
        });
        Self {
            transport,
            state,
            coalesce_window,
            idle_timeout,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn set_network(&self, enabled: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.network != enabled;
            state.network = enabled;
            changed
        });
    }

    /// Replaces the conversation. Refused while a cycle is in flight.
    pub fn reset(&self, conversation: Conversation) -> bool {
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.conversation = conversation;
            true
        })
    }

    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        if input.trim().is_empty() {
            return SubmitOutcome::EmptyInput;
        }
        let Some(_guard) = self.try_begin() else {
            debug!("Submission refused: a request is already in flight");
            return SubmitOutcome::Busy;
        };

        let (history, network) = {
            let state = self.state.borrow();
            let base = if state.conversation.is_terminal() {
                Conversation::new()
            } else {
                state.conversation.clone()
            };
            (base.with_appended([ConversationTurn::user(input)]), state.network)
        };
        let request = ChatRequest::from_turns(history.iter(), network);
        self.state.send_modify(|state| {
            state.conversation = history.with_appended([ConversationTurn::placeholder()]);
        });

        match self.run_cycle(&request).await {
            Ok(()) => SubmitOutcome::Completed,
            Err(e) => {
                error!("Chat request failed: {}", e);
                self.state.send_modify(|state| {
                    state.conversation = state
                        .conversation
                        .with_last_replaced(ConversationTurn::assistant(FAILURE_MESSAGE));
                });
                SubmitOutcome::Failed
            }
        }
    }

    fn try_begin(&self) -> Option<PendingGuard<'_>> {
        let started = self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            state.searching = true;
            true
        });
        started.then(|| PendingGuard { state: &self.state })
    }

    async fn run_cycle(&self, request: &ChatRequest) -> MasonResult<()> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(MasonError::Status {
                status: response.status,
                reason: response.reason,
            });
        }

        let ChatResponse {
            content_type,
            results_header,
            body,
            ..
        } = response;

        let citations = results_header.as_deref().map(parse_results_header);
        self.state.send_modify(|state| {
            state.answered = true;
            if let Some(citations) = citations {
                state.conversation = state
                    .conversation
                    .with_last_turn(|turn| turn.citations = Some(citations));
            }
        });

        let (tx_event, rx_event) = mpsc::unbounded_channel();
        let mut merger = ViewMerger::new(self.coalesce_window, SessionSink::new(&self.state));
        let output_started = || {
            self.state.send_modify(|state| state.searching = false);
        };

        let decode = async {
            if is_json_content_type(content_type.as_deref()) {
                handle_error_body(body, tx_event, self.idle_timeout, output_started).await
            } else {
                handle_chat_stream(body, tx_event, self.idle_timeout, output_started)
                    .await
                    .map(|_| ())
            }
        };
        let (decoded, folded) = tokio::join!(decode, merger.run(rx_event));
        debug!(
            "Chat cycle finished: answer_len={}, reasoning_len={}",
            folded.answer.len(),
            folded.reasoning.len()
        );

        decoded.map_err(|e| MasonError::Stream(e.to_string()))
    }
}
