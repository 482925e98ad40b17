//! Deckhand runtime: the agent loop, its tools, and the model gateway.
//!
//! # Overview
//!
//! - **Agent**: reads user lines, forwards them to the model, runs the tool
//!   calls the model asks for, and sends the results back in one follow-up
//!   turn.
//! - **ToolRegistry**: an immutable table of named tools. The built-in set
//!   reads, lists, and edits files relative to the working directory.
//! - **ChatSession**: the model gateway. It owns the conversation history
//!   and the advertised tool list, and talks to a [`Backend`].
//! - **GeminiBackend**: a [`Backend`] for the Google Gemini API.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{Agent, ChatSession, GeminiBackend, ToolRegistry};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = GeminiBackend::builder("api-key", "gemini-2.0-flash").build();
//! let tools = ToolRegistry::builtin()?;
//! let session = ChatSession::new(backend, tools.list());
//!
//! let mut agent = Agent::new(session, tools);
//! agent.run(std::io::stdin().lock(), std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

mod agent;
mod error;
pub mod model;
pub mod providers;
mod session;
pub mod tools;

pub use agent::{Agent, AgentState, TurnSummary};
pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolOutcome,
    ToolResult, Usage,
};
pub use providers::{GeminiBackend, GeminiBackendBuilder};
pub use session::{ChatSession, Gateway, Turn};
pub use tools::{Param, ParamKind, ToolError, ToolRegistry, ToolSpec};
