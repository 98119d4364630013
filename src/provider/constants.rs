pub mod openai {
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const API_BASE: &str = "https://api.openai.com/v1";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
    pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
    pub const DEFAULT_SECRETS_FILE: &str = ".secrets.env";
}

pub mod sse {
    pub const DATA_PREFIX: &str = "data: ";
    pub const DONE_MARKER: &str = "[DONE]";
}
