use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

/// One `data: ` payload of a streamed chat completion.
///
/// Only the fields the decoder reads are modelled; everything else the
/// provider sends (ids, usage, finish reasons) is ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    // Keepalive chunks may carry `null` in place of a choice.
    #[serde(default)]
    choices: Option<Vec<Option<Choice>>>,
}

/// Text carried by the first choice of a chunk. Absent fields are empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeltaFragments {
    pub content: String,
    pub reasoning: String,
}

impl ChatCompletionChunk {
    pub fn into_fragments(self) -> DeltaFragments {
        let Some(delta) = self
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .flatten()
            .and_then(|choice| choice.delta)
        else {
            return DeltaFragments::default();
        };

        DeltaFragments {
            content: delta.content.unwrap_or_default(),
            reasoning: delta.reasoning_content.unwrap_or_default(),
        }
    }
}

/// Reads the message out of a JSON error body.
///
/// Accepts both `{"error": "..."}` and `{"error": {"message": "..."}}`.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    error
        .get("message")
        .and_then(|value| value.as_str())
        .map(str::to_string)
}
