//! Deterministic provider for tests: replays a queue of prepared turns
//! and records every history it was shown.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmProvider, ModelTurn};
use crate::agents::conversation::Message;
use crate::agents::error::LlmResult;
use crate::agents::tools::ToolDefinition;

#[derive(Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ModelTurn>>,
    transcript: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Every message history this provider has been called with, in order.
    pub fn transcript(&self) -> Vec<Vec<Message>> {
        self.transcript.lock().expect("transcript lock").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn converse(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> LlmResult<ModelTurn> {
        self.transcript
            .lock()
            .expect("transcript lock")
            .push(messages.to_vec());
        let turn = self
            .turns
            .lock()
            .expect("turns lock")
            .pop_front()
            .unwrap_or_else(|| ModelTurn::text("I have nothing further."));
        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_turns_then_falls_back_to_text() {
        let provider = ScriptedProvider::new(vec![ModelTurn::tool("Search", json!({}))]);
        let first = provider.converse(&[Message::user("go")], &[]).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);
        let second = provider.converse(&[], &[]).await.unwrap();
        assert!(second.tool_calls.is_empty());
        assert_eq!(provider.transcript().len(), 2);
    }
}
