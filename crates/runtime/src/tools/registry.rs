//! Immutable table of named tools.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ToolError, ToolSpec, fs};
use crate::model::{ToolCall, ToolResult};
use crate::{Error, Result};

/// Executes a tool against its raw JSON arguments.
pub type Executor = fn(&Value) -> std::result::Result<String, ToolError>;

/// A registered tool: its advertised spec plus the function that runs it.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub spec: ToolSpec,
    pub executor: Executor,
}

/// Registry of tools keyed by name.
///
/// Built once at startup and then only read from.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the filesystem tools.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(fs::read_file_spec(), fs::read_file)?;
        registry.register(fs::list_files_spec(), fs::list_files)?;
        registry.register(fs::edit_file_spec(), fs::edit_file)?;
        Ok(registry)
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, spec: ToolSpec, executor: Executor) -> Result<()> {
        if self.index.contains_key(&spec.name) {
            return Err(Error::DuplicateTool(spec.name));
        }
        self.index.insert(spec.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { spec, executor });
        Ok(())
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All tool specs, in registration order.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool call, always producing a result for it.
    pub fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let outcome = match self.lookup(&call.name) {
            Some(tool) => (tool.executor)(&call.input),
            None => Err(ToolError::ToolNotFound(call.name.clone())),
        };
        if let Err(e) = &outcome {
            tracing::warn!(tool = %call.name, id = %call.id, error = %e, "tool call failed");
        }
        ToolResult::for_call(call, outcome)
    }
}

/// Convert untyped tool arguments into a tool's input shape.
///
/// `null` is read as an empty object so tools without required fields
/// accept a bare call. Nothing is defaulted beyond what the shape declares.
pub(crate) fn parse_args<T: DeserializeOwned>(input: &Value) -> std::result::Result<T, ToolError> {
    let input = match input {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(input).map_err(|e| ToolError::InvalidArgs(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolOutcome;
    use serde_json::json;

    fn echo(input: &Value) -> std::result::Result<String, ToolError> {
        Ok(input.to_string())
    }

    fn call(id: &str, name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    #[test]
    fn builtin_registers_filesystem_tools_in_order() {
        let registry = ToolRegistry::builtin().unwrap();
        let names: Vec<_> = registry.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["read_file", "list_files", "edit_file"]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec::new("echo", "Echo"), echo).unwrap();
        let err = registry
            .register(ToolSpec::new("echo", "Echo again"), echo)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec::new("echo", "Echo"), echo).unwrap();
        assert!(registry.lookup("echo").is_some());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn dispatch_unknown_tool_yields_failure() {
        let registry = ToolRegistry::new();
        let result = registry.dispatch(&call("1", "teleport", json!({})));
        assert_eq!(result.tool_call_id, "1");
        assert_eq!(
            result.outcome,
            ToolOutcome::Failure {
                error: ToolError::ToolNotFound("teleport".into())
            }
        );
    }

    #[test]
    fn dispatch_runs_executor() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec::new("echo", "Echo"), echo).unwrap();
        let result = registry.dispatch(&call("7", "echo", json!({"a": 1})));
        assert_eq!(
            result.outcome,
            ToolOutcome::Success {
                output: r#"{"a":1}"#.into()
            }
        );
    }

    #[test]
    fn parse_args_rejects_wrong_types() {
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Input {
            path: String,
        }
        let err = parse_args::<Input>(&json!({"path": 3})).err().unwrap();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
        let err = parse_args::<Input>(&Value::Null).err().unwrap();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}
