//! Tool specifications advertised to the model.

use serde::{Deserialize, Serialize};

/// The JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// A single named input field of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<Param>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a required parameter.
    pub fn param(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push(name, kind, true, description)
    }

    /// Add an optional parameter.
    pub fn optional(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push(name, kind, false, description)
    }

    fn push(mut self, name: &str, kind: ParamKind, required: bool, description: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
            required,
            description: description.to_string(),
        });
        self
    }

    /// Names of the required parameters, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }
}
