//! Session-scoped message history.
//!
//! Conversations are kept by name; one of them is current. The whole set can
//! be exported to a JSON document and loaded back unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{ChatRole, LlmError, Message};

pub const DEFAULT_CHAT_NAME: &str = "default";

/// Ordered messages of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSessions {
    current: String,
    sessions: BTreeMap<String, ChatHistory>,
}

impl Default for ChatSessions {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_NAME)
    }
}

impl ChatSessions {
    pub fn new(name: &str) -> Self {
        let mut sessions = BTreeMap::new();
        sessions.insert(name.to_string(), ChatHistory::new());
        Self {
            current: name.to_string(),
            sessions,
        }
    }

    /// Switches to `name`, creating an empty conversation if needed.
    pub fn use_chat_name(&mut self, name: &str) {
        self.sessions.entry(name.to_string()).or_default();
        self.current = name.to_string();
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    pub fn history(&self) -> &ChatHistory {
        static EMPTY: ChatHistory = ChatHistory {
            messages: Vec::new(),
        };
        self.sessions.get(&self.current).unwrap_or(&EMPTY)
    }

    fn history_mut(&mut self) -> &mut ChatHistory {
        self.sessions.entry(self.current.clone()).or_default()
    }

    pub fn user_say(&mut self, content: impl Into<String>) {
        self.history_mut().push(Message::user(content));
    }

    pub fn ai_say(&mut self, content: impl Into<String>) {
        self.history_mut().push(Message::assistant(content));
    }

    /// Replaces the content of the last assistant message.
    pub fn update_last(&mut self, content: impl Into<String>) -> Result<(), LlmError> {
        let current = self.current.clone();
        match self.history_mut().messages.last_mut() {
            Some(message) if message.role == ChatRole::Assistant => {
                message.content = content.into();
                Ok(())
            }
            _ => Err(LlmError::History(format!(
                "Conversation '{current}' does not end with an assistant message"
            ))),
        }
    }

    /// Empties the current conversation.
    pub fn clear(&mut self) {
        self.history_mut().messages.clear();
    }

    pub fn to_json(&self) -> Result<String, LlmError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LlmError::parse("Failed to serialize chat history", e))
    }

    pub fn from_json(json: &str) -> Result<Self, LlmError> {
        let mut sessions: Self = serde_json::from_str(json)
            .map_err(|e| LlmError::parse("Failed to parse chat history", e))?;
        if sessions.current.is_empty() {
            return Err(LlmError::History(
                "Chat history has an empty conversation name".to_string(),
            ));
        }
        let current = sessions.current.clone();
        sessions.use_chat_name(&current);
        Ok(sessions)
    }

    /// Renders the current conversation as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.current);
        for message in self.history().messages() {
            out.push_str(&format!("\n**{}:** {}\n", message.role, message.content));
        }
        out
    }
}
