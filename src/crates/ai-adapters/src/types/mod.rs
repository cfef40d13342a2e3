pub mod openai;

pub use openai::{extract_error_message, ChatCompletionChunk, DeltaFragments};
