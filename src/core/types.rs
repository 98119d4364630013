use serde::{Deserialize, Serialize};

use crate::provider::constants::openai::API_KEY_ENV_VAR;

/// Longest prefix of a non-JSON body echoed back in an error, in characters.
pub const NON_JSON_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One incremental piece of streamed text together with its reference slot.
///
/// `references` is always empty for the chat-completions provider; the field
/// is kept so a retrieval-backed provider can fill it without changing the
/// stream item type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub text: String,
    pub references: Vec<String>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }
}

/// Outcome of a synchronous completion.
///
/// Every failure the synchronous path can hit is a variant here rather than an
/// `Err`, so callers always have something to display.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Answer {
        text: String,
        references: Vec<String>,
    },
    MissingCredential,
    /// The body was not JSON. Holds the raw body.
    Decode { body: String },
    /// Error status or an explicit `error` field.
    Provider { message: String },
    /// JSON without the expected `choices[0].message.content`.
    Shape { body: serde_json::Value },
    /// The request never produced a response.
    Transport { message: String },
}

/// Display text paired with the reference list, as handed to a display surface.
pub type CompletionResult = (String, Vec<String>);

impl Completion {
    pub fn into_parts(self) -> CompletionResult {
        match self {
            Completion::Answer { text, references } => (text, references),
            other => (other.to_string(), Vec::new()),
        }
    }
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Answer { text, .. } => write!(f, "{text}"),
            Completion::MissingCredential => write!(f, "{}", missing_credential_message()),
            Completion::Decode { body } => {
                let preview: String = body.chars().take(NON_JSON_PREVIEW_CHARS).collect();
                write!(f, "⚠️ Non-JSON response: {preview}")
            }
            Completion::Provider { message } => write!(f, "API Error: {message}"),
            Completion::Shape { body } => write!(f, "Unexpected response: {body}"),
            Completion::Transport { message } => write!(f, "Request failed: {message}"),
        }
    }
}

pub(crate) fn missing_credential_message() -> String {
    format!("Missing {API_KEY_ENV_VAR} (set it in Environment or secrets file).")
}
