//! Terminal transcript
//!
//! Turns successive session snapshots into the text still missing from the
//! terminal. Reasoning is printed dimmed ahead of the answer.

use crossterm::style::Stylize;
use mason_core::{Citation, Role, SessionState};

#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    styled: bool,
    turn_index: Option<usize>,
    searching_shown: bool,
    citations_shown: bool,
    reasoning_shown: String,
    answer_shown: String,
}

impl TranscriptRenderer {
    pub fn new(styled: bool) -> Self {
        Self {
            styled,
            ..Default::default()
        }
    }

    /// Text to append for `state`, given everything printed so far.
    pub fn render(&mut self, state: &SessionState) -> String {
        let mut out = String::new();
        let Some(turn) = state.conversation.last() else {
            return out;
        };
        if turn.role != Role::Assistant {
            return out;
        }

        let index = state.conversation.len() - 1;
        if self.turn_index != Some(index) {
            *self = Self {
                styled: self.styled,
                turn_index: Some(index),
                ..Default::default()
            };
        }

        if state.show_searching_indicator() && !self.searching_shown {
            self.searching_shown = true;
            out.push_str(&self.dim("Searching...\n"));
        }

        if let Some(citations) = turn.citations.as_deref().filter(|c| !c.is_empty()) {
            if !self.citations_shown {
                self.citations_shown = true;
                out.push_str(&self.sources(citations));
            }
        }

        let reasoning = turn.reasoning.as_deref().unwrap_or_default();
        let reasoning_delta = take_delta(reasoning, &mut self.reasoning_shown);
        if !reasoning_delta.is_empty() {
            out.push_str(&self.dim(&reasoning_delta));
        }

        let answer_delta = take_delta(&turn.content, &mut self.answer_shown);
        if !answer_delta.is_empty() {
            if !self.reasoning_shown.is_empty() && self.answer_shown.len() == answer_delta.len() {
                out.push_str("\n\n");
            }
            out.push_str(&answer_delta);
        }

        out
    }

    fn sources(&self, citations: &[Citation]) -> String {
        let mut block = format!("Sources ({}):\n", citations.len());
        for (index, citation) in citations.iter().enumerate() {
            block.push_str(&format!("  {}. {} <{}>\n", index + 1, citation.title, citation.url));
        }
        self.dim(&block)
    }

    fn dim(&self, text: &str) -> String {
        if self.styled {
            text.dark_grey().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Returns the unseen suffix of `full`. Text that no longer extends what was
/// shown (a replaced turn) is returned whole on a fresh line. A field the
/// replacement left empty prints nothing.
fn take_delta(full: &str, shown: &mut String) -> String {
    if full.is_empty() || full == shown.as_str() {
        return String::new();
    }
    let delta = match full.strip_prefix(shown.as_str()) {
        Some(suffix) => suffix.to_string(),
        None => format!("\n{}", full),
    };
    *shown = full.to_string();
    delta
}
