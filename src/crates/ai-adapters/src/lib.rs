//! Mason AI adapters
//!
//! Decodes streamed chat completion responses into classified text deltas.

pub mod stream_handler;
pub mod types;

pub use stream_handler::{
    handle_chat_stream, handle_error_body, is_json_content_type, DecodeStats, StreamDecoder,
};
pub use types::openai::{ChatCompletionChunk, DeltaFragments};
