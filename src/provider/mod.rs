pub(crate) mod constants;
pub(crate) mod openai;
pub(crate) mod stream;

pub use constants::openai::{API_BASE, API_KEY_ENV_VAR, DEFAULT_MODEL};
pub use openai::{CompletionRequest, OpenAiClient, OpenAiConfig, interpret_response};
pub use stream::{FragmentStream, LineEvent, decode_line, fragment_stream, single_fragment};
