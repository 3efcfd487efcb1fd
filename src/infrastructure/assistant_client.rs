use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

const RESPONSES_PATH: &str = "responses";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

impl AssistantMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Clone)]
pub struct AssistantRequest {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<AssistantMessage>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl std::fmt::Debug for AssistantRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantRequest")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

/// Sends one prompt to the assistant service and returns the text of its
/// reply. Implementations do not retry.
#[async_trait]
pub trait AssistantHttpClient: Send + Sync {
    async fn create_response(&self, request: AssistantRequest) -> Result<String, InfraError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestAssistantClient {
    client: Client,
}

impl ReqwestAssistantClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("assistant api error: http {}", status.as_u16())
        } else {
            format!("assistant api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Generation(message)
    }

    fn responses_endpoint(base_url: &Url) -> Result<Url, InfraError> {
        base_url
            .join(RESPONSES_PATH)
            .map_err(|error| InfraError::Configuration(format!("invalid responses endpoint: {error}")))
    }
}

#[derive(Debug, serde::Serialize)]
struct ResponsesRequestBody<'a> {
    model: &'a str,
    input: &'a [AssistantMessage],
    temperature: f64,
    max_output_tokens: u32,
    text: TextOptions,
}

#[derive(Debug, serde::Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, serde::Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, serde::Deserialize)]
struct ResponsesPayload {
    output: Option<Vec<OutputItem>>,
}

#[derive(Debug, serde::Deserialize)]
struct OutputItem {
    content: Option<Vec<OutputContent>>,
}

#[derive(Debug, serde::Deserialize)]
struct OutputContent {
    text: Option<String>,
}

impl ResponsesPayload {
    // Reasoning items carry no content, so the first item with text wins.
    fn first_text(self) -> Option<String> {
        self.output
            .unwrap_or_default()
            .into_iter()
            .flat_map(|item| item.content.unwrap_or_default())
            .find_map(|content| content.text)
    }
}

#[async_trait]
impl AssistantHttpClient for ReqwestAssistantClient {
    async fn create_response(&self, request: AssistantRequest) -> Result<String, InfraError> {
        if request.api_key.trim().is_empty() {
            return Err(InfraError::Configuration("api key must not be empty".to_string()));
        }

        let endpoint = Self::responses_endpoint(&request.base_url)?;
        let body = ResponsesRequestBody {
            model: &request.model,
            input: &request.messages,
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            text: TextOptions {
                format: TextFormat {
                    kind: "json_object",
                },
            },
        };

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                InfraError::Generation(format!("network error while requesting schedule: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            InfraError::Generation(format!("failed reading assistant response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let parsed: ResponsesPayload = serde_json::from_str(&body).map_err(|error| {
            InfraError::Generation(format!("invalid assistant payload: {error}; body={body}"))
        })?;
        parsed
            .first_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| InfraError::Generation("assistant response did not include text".to_string()))
    }
}
