use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::UpstreamError;

const API_TIMEOUT: Duration = Duration::from_secs(30);
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// A sent document's identifiers, as returned by `sendDocument`.
#[derive(Debug, Clone)]
pub struct SentDocument {
    pub message_id: i32,
    pub file_id: String,
}

/// The messaging platform surface the worker and resolver depend on.
/// Abstracted behind a trait so tests can swap in a fixture instead of
/// making real network calls.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn send_document(
        &self,
        bot_token: &str,
        chat_id: i64,
        document_path: &std::path::Path,
        caption: &str,
    ) -> Result<SentDocument, UpstreamError>;

    async fn get_file_path(&self, bot_token: &str, file_id: &str) -> Result<String, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    parameters: Option<ApiErrorParameters>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SendDocumentResult {
    message_id: i32,
    document: DocumentResult,
}

#[derive(Debug, Deserialize)]
struct DocumentResult {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct GetFileResult {
    file_path: String,
}

/// `reqwest`-backed implementation. Two separate clients are held because
/// the API and upload paths carry different timeout budgets.
pub struct HttpMessagingClient {
    api: reqwest::Client,
    upload: reqwest::Client,
}

impl HttpMessagingClient {
    pub fn new() -> Result<Self, UpstreamError> {
        let api = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .connect_timeout(API_CONNECT_TIMEOUT)
            .build()?;
        let upload = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .connect_timeout(UPLOAD_TIMEOUT)
            .build()?;
        Ok(Self { api, upload })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, UpstreamError> {
        let status = resp.status();
        let body = resp.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|_| UpstreamError::Api {
            status: status.as_u16(),
            body: body.clone(),
        })?;

        if status.as_u16() == 429 {
            let retry_after = envelope
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(1);
            return Err(UpstreamError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !envelope.ok {
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body: envelope.description.unwrap_or(body),
            });
        }

        envelope.result.ok_or(UpstreamError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    async fn send_document(
        &self,
        bot_token: &str,
        chat_id: i64,
        document_path: &std::path::Path,
        caption: &str,
    ) -> Result<SentDocument, UpstreamError> {
        let bytes = tokio::fs::read(document_path)
            .await
            .map_err(|e| UpstreamError::Api {
                status: 0,
                body: format!("failed to read staged file: {e}"),
            })?;
        let filename = document_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let url = format!("https://api.telegram.org/bot{bot_token}/sendDocument");
        let resp = self.upload.post(url).multipart(form).send().await?;
        let result: SendDocumentResult = Self::decode(resp).await?;
        Ok(SentDocument {
            message_id: result.message_id,
            file_id: result.document.file_id,
        })
    }

    async fn get_file_path(&self, bot_token: &str, file_id: &str) -> Result<String, UpstreamError> {
        let url = format!("https://api.telegram.org/bot{bot_token}/getFile");
        let resp = self.api.get(url).query(&[("file_id", file_id)]).send().await?;
        let result: GetFileResult = Self::decode(resp).await?;
        Ok(result.file_path)
    }
}

/// Builds the download URL for an already-resolved `file_path`.
pub fn file_download_url(bot_token: &str, file_path: &str) -> String {
    format!("https://api.telegram.org/file/bot{bot_token}/{file_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_download_url() {
        assert_eq!(
            file_download_url("123:abc", "documents/file_0.jpg"),
            "https://api.telegram.org/file/bot123:abc/documents/file_0.jpg"
        );
    }
}
