use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("History error: {0}")]
    History(String),
}

impl LlmError {
    pub(crate) fn network(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LlmError::Network {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LlmError::Parse {
            message: message.into(),
            source: source.into(),
        }
    }
}
