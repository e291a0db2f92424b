//! `OpenAI`-compatible chat-completions client

use super::types::{ChatMessage, ChatRequest, FunctionCall, Generation, Usage};
use super::{ChatClient, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for `/chat/completions` with function calling
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<&str>,
    ) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{base}/chat/completions"),
        })
    }

    fn translate_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if !request.system_prompt.is_empty() {
            messages.push(Self::translate_message(&ChatMessage::system(
                request.system_prompt.clone(),
            )));
        }
        messages.extend(request.messages.iter().map(Self::translate_message));

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAiTool {
                        r#type: "function".to_string(),
                        function: OpenAiFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            tools,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn translate_message(msg: &ChatMessage) -> OpenAiMessage {
        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            name: msg.name.clone(),
            content: Some(msg.content.clone()),
            tool_calls: None,
        }
    }

    fn normalize_response(resp: OpenAiResponse) -> Result<Generation, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let mut function_calls = Vec::new();
        for tc in choice.message.tool_calls.unwrap_or_default() {
            if tc.function.name.is_empty() {
                continue;
            }
            let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                tracing::warn!(error = %e, arguments = %tc.function.arguments, "Failed to parse function call arguments");
                serde_json::json!({})
            });
            function_calls.push(FunctionCall {
                id: tc.id,
                name: tc.function.name,
                arguments,
            });
        }

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(Generation {
            text: choice.message.content.unwrap_or_default(),
            function_calls,
            usage,
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn generate(&self, request: &ChatRequest) -> Result<Generation, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<OpenAiErrorResponse>(&body) {
                return Err(LlmError::from_status(status.as_u16(), &error_resp.error.message));
            }
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    r#type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
