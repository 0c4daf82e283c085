pub mod conversation;
pub mod error;
pub mod llm;
pub mod specialist;
pub mod tools;

pub use conversation::{Message, Role};
pub use error::{AgentError, AgentResult, LlmError, LlmResult, ToolFault};
pub use tools::{declaration_for, ToolCall, ToolDefinition};
