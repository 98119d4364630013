//! # chatbox
//!
//! Chat front end for OpenAI-style chat completions. Queries go out either as
//! one blocking request or as a streamed response that is folded into a
//! growing answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatbox::{ApiKey, CompletionProvider, OpenAiClient, OpenAiConfig, aggregate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::new(OpenAiConfig::new(ApiKey::Default))?;
//!
//!     let (text, _references) = client.chat("Say hello").await.into_parts();
//!     println!("{text}");
//!
//!     let stream = client.chat_stream("Count to five").await?;
//!     let answer = aggregate(stream, |snapshot| println!("{}", snapshot.text)).await?;
//!     println!("final: {}", answer.text);
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod core;
pub mod history;
pub mod provider;

pub use aggregator::{Aggregator, Snapshot, UpdateState, aggregate};
pub use crate::core::{
    ApiKey, ChatRole, Completion, CompletionProvider, CompletionResult, Credential, Fragment,
    HttpClientConfig, LlmError, Message,
};
pub use history::{ChatHistory, ChatSessions};
pub use provider::{FragmentStream, OpenAiClient, OpenAiConfig};
