//! Conversation session: the model gateway seen by the agent loop.

use std::future::Future;

use crate::model::{Backend, Message, ModelError, ModelRequest, ToolResult, Usage};
use crate::tools::ToolSpec;

/// One unit of content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// Free-form user text.
    Text(String),
    /// Results for every tool call of the previous model reply.
    ToolResults(Vec<ToolResult>),
}

impl From<Turn> for Message {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::Text(text) => Message::user(text),
            Turn::ToolResults(results) => Message::tool_results(results),
        }
    }
}

/// Sends turns to the model and returns its reply.
///
/// The gateway owns the conversation history; callers only append to it.
pub trait Gateway: Send {
    fn send_turn(&mut self, turn: Turn) -> impl Future<Output = Result<Message, ModelError>> + Send;
}

/// A conversation with a backend.
pub struct ChatSession<B> {
    backend: B,
    tools: Vec<ToolSpec>,
    history: Vec<Message>,
    usage: Usage,
}

impl<B: Backend> ChatSession<B> {
    /// Start a session advertising the given tools for its whole lifetime.
    pub fn new(backend: B, tools: Vec<ToolSpec>) -> Self {
        Self {
            backend,
            tools,
            history: Vec::new(),
            usage: Usage::default(),
        }
    }

    /// Every message exchanged so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Tools advertised to the model.
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Token usage summed over all calls.
    pub fn usage(&self) -> Usage {
        self.usage
    }
}

impl<B: Backend> Gateway for ChatSession<B> {
    async fn send_turn(&mut self, turn: Turn) -> Result<Message, ModelError> {
        self.history.push(turn.into());

        let request = ModelRequest {
            messages: &self.history,
            tools: &self.tools,
        };
        let response = match self.backend.call(request).await {
            Ok(response) => response,
            Err(e) => {
                // The turn was never answered; keep history well-formed.
                self.history.pop();
                return Err(e);
            }
        };

        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call complete"
        );
        self.usage += response.usage;
        self.history.push(response.message.clone());
        Ok(response.message)
    }
}
