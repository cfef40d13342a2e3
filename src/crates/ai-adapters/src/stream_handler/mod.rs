pub mod decoder;
pub mod openai;

pub use decoder::{DecodeStats, StreamDecoder};
pub use openai::{handle_chat_stream, handle_error_body, is_json_content_type};
