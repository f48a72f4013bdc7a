use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tap::Pipe;
use tracing::{debug, warn};

use super::{Error, FinishReason, Result};
use crate::config::{ApiKey, ConsultConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatCompletionMessageRole {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: ChatCompletionMessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatCompletionMessageRole::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatCompletionMessageRole::User,
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice.
    pub fn into_first_content(self) -> Result<String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(Error::EmptyChatCompletion)?;
        if choice.finish_reason == Some(FinishReason::Length) {
            debug!("chat completion stopped at the token limit");
        }
        choice
            .message
            .content
            .ok_or(Error::EmptyChatCompletion)?
            .trim()
            .to_string()
            .pipe(Ok)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Chat models the consultation can be run against.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatCompletionModel {
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-3.5-turbo-16k")]
    Gpt35Turbo16k,
}

impl fmt::Display for ChatCompletionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gpt4 => "gpt-4",
            Self::Gpt4Turbo => "gpt-4-turbo",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
            Self::Gpt35Turbo16k => "gpt-3.5-turbo-16k",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: ChatCompletionModel,
    messages: &'a [ChatCompletionMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionArgs {
    pub messages: Vec<ChatCompletionMessage>,
    pub model: ChatCompletionModel,
    pub max_tokens: Option<u16>,
    pub temperature: Option<f32>,
}

impl ChatCompletionArgs {
    pub fn new(model: ChatCompletionModel) -> Self {
        Self {
            messages: Vec::new(),
            model,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_message(mut self, message: ChatCompletionMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u16) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn request(&self) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: self.model,
            messages: &self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// HTTP session for the chat completion endpoint.
///
/// The inner `reqwest::Client` pools connections, so a single `ChatClient`
/// can serve any number of concurrent requests through `&self`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    key: ApiKey,
}

impl ChatClient {
    pub fn new(config: &ConsultConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.accept_invalid_certs {
            warn!(
                endpoint = %config.endpoint,
                "TLS certificate verification is disabled for chat completion requests"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        Self {
            http: builder.build().map_err(Error::ClientError)?,
            endpoint: config.endpoint.clone(),
            key: config.api_key.clone(),
        }
        .pipe(Ok)
    }

    /// Request a chat completion.
    pub async fn chat_completion(
        &self,
        args: &ChatCompletionArgs,
    ) -> Result<ChatCompletionResponse> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.key.expose())
            .json(&args.request())
            .send()
            .await
            .map_err(Error::InvalidChatCompletion)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(Error::InvalidChatCompletion)?;
        parse_response(status, &body)
    }
}

fn parse_response(status: StatusCode, body: &[u8]) -> Result<ChatCompletionResponse> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorResponse>(body)
            .map(|x| x.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
        return Err(Error::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_slice(body).map_err(Error::FormatError)
}
