//! Interact with OpenAI's chat completion API.

pub mod chat;

use serde::{Deserialize, Serialize};

/// Why a single chat completion request produced no answer.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    ClientError(reqwest::Error),
    #[error("failed to request chat completion: {0}")]
    InvalidChatCompletion(#[from] reqwest::Error),
    #[error("chat completion failed with status {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("chat format error: {0}")]
    FormatError(serde_json::Error),
    #[error("chat completion returned no messages")]
    EmptyChatCompletion,
}

type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    #[serde(other)]
    Other,
}
