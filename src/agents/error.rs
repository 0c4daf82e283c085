use thiserror::Error;

use crate::providers::ProviderError;

/// Failures talking to the language model. These are the only errors a
/// specialist agent treats as fatal.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse model response: {0}")]
    Parse(String),

    #[error("request timed out")]
    Timeout,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if let Some(status) = err.status() {
            LlmError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Fatal agent and orchestrator failures. Everything recoverable inside
/// the tool loop goes through [`ToolFault`] instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Recoverable tool-execution faults. These never abort the loop; they
/// are serialized into a tool-result payload the model can react to.
#[derive(Debug, Error)]
pub enum ToolFault {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ToolFault {
    /// A corrective hint fed back to the model alongside the error text.
    pub fn hint(&self) -> Option<String> {
        match self {
            ToolFault::UnknownTool(_) => {
                Some("Use only the tools declared for this conversation.".to_string())
            }
            ToolFault::InvalidArguments(_) => {
                Some("Check the required fields and retry with corrected arguments.".to_string())
            }
            ToolFault::Provider(err) => err.hint(),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
pub type LlmResult<T> = Result<T, LlmError>;
