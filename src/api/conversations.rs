use tracing::debug;

use crate::api::{ApiError, ConversationCreated};
use crate::utils::url::construct_api_url;

/// `POST /conversations`: ask the service for a fresh conversation id.
pub async fn create_conversation(
    client: &reqwest::Client,
    server_url: &str,
) -> Result<ConversationCreated, ApiError> {
    let url = construct_api_url(server_url, "conversations");
    debug!(%url, "creating conversation");

    let response = client.post(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }

    serde_json::from_str::<ConversationCreated>(&body).map_err(ApiError::Decode)
}

/// `POST /conversations/{id}/end`. The response body is ignored.
pub async fn end_conversation(
    client: &reqwest::Client,
    server_url: &str,
    conversation_id: &str,
) -> Result<(), ApiError> {
    let url = construct_api_url(server_url, &format!("conversations/{conversation_id}/end"));
    debug!(%url, "ending conversation");

    let response = client.post(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            body: String::new(),
        });
    }
    Ok(())
}
