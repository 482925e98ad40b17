//! Google Gemini API backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolOutcome,
    ToolResult, Usage,
};
use crate::tools::{ParamKind, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_TOKENS: u32 = 4096;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

/// A content part. Exactly one field is set; unknown kinds deserialize
/// with every field empty and are skipped.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    #[serde(default, skip_serializing)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl GeminiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Point at a different API root, e.g. a proxy.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn build(self) -> GeminiBackend {
        GeminiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            base_url: self.base_url,
        }
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    base_url: String,
}

impl GeminiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> GeminiBackendBuilder {
        GeminiBackendBuilder::new(api_key, model)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User | Role::System => "user",
            Role::Assistant => "model",
        }
    }

    fn part_to_api(part: &Part) -> ApiPart {
        match part {
            Part::Text(text) => ApiPart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::ToolCall(call) => ApiPart {
                function_call: Some(ApiFunctionCall {
                    id: None,
                    name: call.name.clone(),
                    args: call.input.clone(),
                }),
                ..Default::default()
            },
            Part::ToolResult(result) => ApiPart {
                function_response: Some(ApiFunctionResponse {
                    name: result.name.clone(),
                    response: Self::outcome_to_api(result),
                }),
                ..Default::default()
            },
        }
    }

    fn outcome_to_api(result: &ToolResult) -> Value {
        match &result.outcome {
            ToolOutcome::Success { output } => json!({ "result": output }),
            ToolOutcome::Failure { error } => json!({ "error": error.to_string() }),
        }
    }

    fn message_to_api(msg: &Message) -> ApiContent {
        ApiContent {
            role: Some(Self::role_to_api(msg.role).to_string()),
            parts: msg.parts.iter().map(Self::part_to_api).collect(),
        }
    }

    fn kind_to_api(kind: ParamKind) -> &'static str {
        match kind {
            ParamKind::String => "STRING",
            ParamKind::Number => "NUMBER",
            ParamKind::Integer => "INTEGER",
            ParamKind::Boolean => "BOOLEAN",
            ParamKind::Array => "ARRAY",
            ParamKind::Object => "OBJECT",
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiFunctionDeclaration {
        let properties: Map<String, Value> = spec
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({
                        "type": Self::kind_to_api(p.kind),
                        "description": p.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = spec.required().collect();

        ApiFunctionDeclaration {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: json!({
                "type": "OBJECT",
                "properties": properties,
                "required": required,
            }),
        }
    }

    fn response_to_message(response: ApiResponse) -> Result<Message, ModelError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no candidates in response".into()))?;

        let finish_reason = candidate.finish_reason;
        let parts: Vec<Part> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| {
                if let Some(call) = part.function_call {
                    let id = call
                        .id
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
                    return Some(Part::ToolCall(ToolCall {
                        id,
                        name: call.name,
                        input: call.args,
                    }));
                }
                part.text.map(Part::Text)
            })
            .collect();

        // Gemini rejects a model turn without parts, so never record one.
        if parts.is_empty() {
            return Err(ModelError::InvalidResponse(format!(
                "empty reply (finish reason: {})",
                finish_reason.as_deref().unwrap_or("unspecified")
            )));
        }

        Ok(Message {
            role: Role::Assistant,
            parts,
        })
    }

    fn build_request(&self, request: &ModelRequest<'_>) -> ApiRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(Self::message_to_api)
            .collect();

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![ApiTool {
                function_declarations: request.tools.iter().map(Self::tool_to_api).collect(),
            }]
        };

        let system_instruction = self.system.as_ref().map(|s| ApiContent {
            role: None,
            parts: vec![ApiPart {
                text: Some(s.clone()),
                ..Default::default()
            }],
        });

        ApiRequest {
            contents,
            tools,
            system_instruction,
            generation_config: ApiGenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl Backend for GeminiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(&request);
        tracing::debug!(
            model = %self.model,
            messages = api_request.contents.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let usage = api_response
            .usage_metadata
            .as_ref()
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();
        let message = Self::response_to_message(api_response)?;

        Ok(ModelResponse { message, usage })
    }
}
