pub mod gemini;
pub mod scripted;

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::conversation::Message;
use super::error::{LlmError, LlmResult};
use super::tools::{ToolCall, ToolDefinition};
use crate::config::LlmSettings;

pub use gemini::GeminiProvider;
pub use scripted::ScriptedProvider;

/// One model response: optional prose plus zero or more tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![ToolCall::new("call_0", name, arguments)],
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, arguments: Value) -> Self {
        let id = format!("call_{}", self.tool_calls.len());
        self.tool_calls.push(ToolCall::new(id, name, arguments));
        self
    }
}

/// Vendor-neutral conversation capability. History and tool definitions
/// stay in domain shape; each provider converts at its own boundary.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> LlmResult<ModelTurn>;
}

/// Build the configured provider, resolving the API key from the
/// environment variable the settings name.
pub fn create_provider(settings: &LlmSettings) -> LlmResult<Arc<dyn LlmProvider>> {
    let api_key = env::var(&settings.api_key_env).map_err(|_| {
        LlmError::Authentication(format!(
            "environment variable {} not set",
            settings.api_key_env
        ))
    })?;
    Ok(Arc::new(GeminiProvider::new(settings, api_key)))
}
