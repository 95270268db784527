//! Wire types for the conversation service.

pub mod conversations;

use serde::{Deserialize, Deserializer};
use std::error::Error as StdError;
use std::fmt;

/// Response body of `POST /conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationCreated {
    #[serde(deserialize_with = "conversation_id_as_string")]
    pub conversation_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConversationId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn conversation_id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawConversationId::deserialize(deserializer)? {
        RawConversationId::Text(id) => id,
        RawConversationId::Signed(id) => id.to_string(),
        RawConversationId::Unsigned(id) => id.to_string(),
    })
}

/// Failures talking to the HTTP side of the conversation service.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be sent or the body could not be read.
    Request(reqwest::Error),
    /// The service answered with a non-success status.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The body was not a valid `ConversationCreated` payload.
    Decode(serde_json::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request(source) => write!(f, "request failed: {source}"),
            ApiError::Status { status, body } if body.trim().is_empty() => {
                write!(f, "service returned {status}")
            }
            ApiError::Status { status, body } => {
                write!(f, "service returned {status}: {}", body.trim())
            }
            ApiError::Decode(source) => write!(f, "unexpected response body: {source}"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Request(source) => Some(source),
            ApiError::Decode(source) => Some(source),
            ApiError::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        ApiError::Request(source)
    }
}
