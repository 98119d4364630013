use std::path::PathBuf;

use clap::Parser;

/// Chat with an OpenAI-style completion endpoint from the terminal
#[derive(Debug, Parser)]
#[command(name = "chatbox", version, about)]
pub struct Args {
    /// Model identifier sent with every request
    #[arg(long, env = "OPENAI_MODEL", default_value = chatbox::provider::DEFAULT_MODEL)]
    pub model: String,

    /// API base URL; `/chat/completions` is appended
    #[arg(long, env = "OPENAI_BASE_URL", default_value = chatbox::provider::API_BASE)]
    pub base_url: String,

    /// dotenv-format file consulted when OPENAI_API_KEY is not set
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,

    /// Start with streamed answers enabled
    #[arg(long)]
    pub stream: bool,

    /// Conversation to start in
    #[arg(long, default_value = chatbox::history::DEFAULT_CHAT_NAME)]
    pub chat: String,

    /// Timeout for non-streamed requests, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}
