//! LLM provider adapters.
//!
//! Each provider implements [`Backend`](crate::Backend) for its specific API.

mod gemini;

pub use gemini::{GeminiBackend, GeminiBackendBuilder};
