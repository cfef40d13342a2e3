// Mason Core Library - chat session logic independent of any renderer
// Layers: Util -> Config -> Transport -> Session

pub mod config;
pub mod session; // Conversation state, view merger, request cycle
pub mod transport; // Completion endpoint access
pub mod util; // Errors

// Export main types
pub use util::errors::*;

pub use config::{MasonConfig, RuntimeEnvironment};
pub use session::{
    Accumulator, ChatSession, Conversation, SessionState, SnapshotSink, SubmitOutcome, ViewMerger,
};
pub use transport::{ChatResponse, ChatTransport, HttpTransport};

pub use mason_core_types::{Citation, ConversationTurn, Role, StreamEvent, FAILURE_MESSAGE};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
