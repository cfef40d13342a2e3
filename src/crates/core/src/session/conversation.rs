use mason_core_types::{ConversationTurn, Role};
use std::sync::Arc;

/// Immutable, chronologically ordered sequence of turns.
///
/// Every update returns a new value. Earlier turns are shared between the
/// old and new value; an updated last turn is always a fresh allocation, so
/// a holder of a previously published conversation never sees it change.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Arc<[Arc<ConversationTurn>]>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            turns: Arc::from(Vec::new()),
        }
    }
}

impl PartialEq for Conversation {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: impl IntoIterator<Item = ConversationTurn>) -> Self {
        Self {
            turns: turns.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().map(|turn| turn.as_ref())
    }

    pub fn get(&self, index: usize) -> Option<&ConversationTurn> {
        self.turns.get(index).map(|turn| turn.as_ref())
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last().map(|turn| turn.as_ref())
    }

    /// A conversation that opens with an assistant turn is finished; the next
    /// submission starts a new thread.
    pub fn is_terminal(&self) -> bool {
        self.turns
            .first()
            .is_some_and(|turn| turn.role == Role::Assistant)
    }

    pub fn with_appended(&self, turns: impl IntoIterator<Item = ConversationTurn>) -> Self {
        Self {
            turns: self
                .turns
                .iter()
                .cloned()
                .chain(turns.into_iter().map(Arc::new))
                .collect(),
        }
    }

    /// Copies the last turn, applies `update` to the copy and returns the new
    /// sequence. An empty conversation is returned unchanged.
    pub fn with_last_turn(&self, update: impl FnOnce(&mut ConversationTurn)) -> Self {
        let Some((last, earlier)) = self.turns.split_last() else {
            return self.clone();
        };

        let mut last = ConversationTurn::clone(last);
        update(&mut last);
        Self {
            turns: earlier
                .iter()
                .cloned()
                .chain(std::iter::once(Arc::new(last)))
                .collect(),
        }
    }

    pub fn with_last_replaced(&self, turn: ConversationTurn) -> Self {
        self.with_last_turn(|last| *last = turn)
    }

    /// Whether both conversations hold the very same allocation at `index`.
    pub fn shares_turn(&self, other: &Conversation, index: usize) -> bool {
        match (self.turns.get(index), other.turns.get(index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Conversation {
        Conversation::from_turns([
            ConversationTurn::user("hi"),
            ConversationTurn::placeholder(),
        ])
    }

    #[test]
    fn updating_last_turn_leaves_previous_value_untouched() {
        let before = sample();
        let after = before.with_last_turn(|turn| turn.content = "Hello".to_string());

        assert_eq!(before.last().map(|t| t.content.as_str()), Some(""));
        assert_eq!(after.last().map(|t| t.content.as_str()), Some("Hello"));
        assert!(before.shares_turn(&after, 0));
        assert!(!before.shares_turn(&after, 1));
    }

    #[test]
    fn appending_shares_existing_turns() {
        let before = Conversation::from_turns([ConversationTurn::user("a")]);
        let after = before.with_appended([ConversationTurn::placeholder()]);

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert!(before.shares_turn(&after, 0));
    }

    #[test]
    fn empty_conversation_ignores_last_turn_update() {
        let empty = Conversation::new();
        let updated = empty.with_last_turn(|turn| turn.content = "x".to_string());
        assert!(updated.is_empty());
    }

    #[test]
    fn assistant_first_conversation_is_terminal() {
        assert!(!sample().is_terminal());
        assert!(!Conversation::new().is_terminal());
        assert!(Conversation::from_turns([ConversationTurn::assistant("done")]).is_terminal());
    }

    #[test]
    fn replacing_last_turn_drops_its_fields() {
        let mut turn = ConversationTurn::placeholder();
        turn.reasoning = Some("hmm".to_string());
        let conversation = Conversation::from_turns([ConversationTurn::user("q"), turn]);

        let replaced = conversation.with_last_replaced(ConversationTurn::assistant("failed"));

        assert_eq!(replaced.last(), Some(&ConversationTurn::assistant("failed")));
        assert_eq!(replaced.len(), 2);
    }
}
