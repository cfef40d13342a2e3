use super::conversation::Conversation;
use mason_core_types::ConversationTurn;

/// Everything a renderer needs, published as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub conversation: Conversation,
    /// A request cycle is in flight; new submissions are refused
    pub loading: bool,
    /// Waiting for the first output of the current response
    pub searching: bool,
    /// At least one response has been accepted by the endpoint
    pub answered: bool,
    /// Web search toggle sent with each request
    pub network: bool,
}

impl SessionState {
    pub fn show_searching_indicator(&self) -> bool {
        self.searching
            && self
                .conversation
                .last()
                .is_some_and(ConversationTurn::is_empty_assistant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response streamed to completion (including a JSON error body)
    Completed,
    /// The pending turn was replaced with the failure message
    Failed,
    /// Another request was still in flight
    Busy,
    EmptyInput,
}
