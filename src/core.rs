pub mod config;
pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use config::{ApiKey, Credential};
pub use error::LlmError;
pub use http::{HttpClient, HttpClientConfig, RawResponse};
pub use traits::CompletionProvider;
pub use types::{ChatRole, Completion, CompletionResult, Fragment, Message};
