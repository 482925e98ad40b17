//! Tool registry and the built-in filesystem tools.

pub mod errors;
pub mod fs;
mod registry;
mod types;

pub use errors::ToolError;
pub use registry::{Executor, RegisteredTool, ToolRegistry};
pub use types::{Param, ParamKind, ToolSpec};
