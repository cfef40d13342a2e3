//! Chat session
//!
//! Conversation state, view merging and the request/response cycle.

pub mod citations;
pub mod conversation;
pub mod cycle;
pub mod merger;
pub mod state;

pub use citations::parse_results_header;
pub use conversation::Conversation;
pub use cycle::ChatSession;
pub use merger::{Accumulator, SessionSink, SnapshotSink, ViewMerger};
pub use state::{SessionState, SubmitOutcome};
