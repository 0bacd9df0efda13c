//! # lexdraft Client
//!
//! [`DocumentApi`] over HTTP.
//!
//! | Operation      | Request                                   |
//! |----------------|-------------------------------------------|
//! | fetch document | `GET /documents/{id}`                     |
//! | fetch content  | `GET /documents/{id}/content`             |
//! | save draft     | `PUT /documents/{id}/content`             |
//! | publish        | `POST /documents/{id}/publish`            |
//! | download       | `GET /documents/{id}/download?format=...` |
//!
//! `404` maps to [`ApiError::NotFound`], `402` to
//! [`ApiError::PaymentRequired`], any other failure status to
//! [`ApiError::Status`].

use async_trait::async_trait;
use lexdraft_editor::{
    ApiError, DocumentApi, DocumentContent, DocumentId, DocumentResponse, Download,
    DownloadFormat, DraftUpdate, PaymentOption, PublishRecord,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct PaymentRequiredBody {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    payment_options: Vec<PaymentOption>,
}

/// 402 bodies come either flat or wrapped in `detail`
#[derive(Deserialize)]
#[serde(untagged)]
enum PaymentRequiredEnvelope {
    Wrapped { detail: PaymentRequiredBody },
    Flat(PaymentRequiredBody),
}

pub struct HttpDocumentApi {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpDocumentApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Network(format!("Invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Network(format!("Invalid base URL {}", config.base_url)));
        }

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/documents/{id}/{tail..}`, each segment percent-encoded
    fn url(&self, id: &DocumentId, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("documents")
                .push(id.as_str())
                .extend(tail);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Document API request");
        let request = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, id: &DocumentId) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(error_for_status(status, id, &text))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn error_for_status(status: StatusCode, id: &DocumentId, body: &str) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(id.to_string()),
        StatusCode::PAYMENT_REQUIRED => {
            let body = match serde_json::from_str(body) {
                Ok(PaymentRequiredEnvelope::Wrapped { detail }) => detail,
                Ok(PaymentRequiredEnvelope::Flat(body)) => body,
                Err(_) => PaymentRequiredBody::default(),
            };
            ApiError::PaymentRequired {
                reason: body.reason,
                message: if body.message.is_empty() {
                    "Payment required".to_string()
                } else {
                    body.message
                },
                payment_options: body.payment_options,
            }
        }
        _ => ApiError::Status {
            status: status.as_u16(),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn fetch_document(&self, id: &DocumentId) -> Result<DocumentResponse, ApiError> {
        let request = self.request(Method::GET, self.url(id, &[]));
        let response = self.send(request, id).await?;
        Self::json(response).await
    }

    async fn fetch_content(&self, id: &DocumentId) -> Result<DocumentContent, ApiError> {
        let request = self.request(Method::GET, self.url(id, &["content"]));
        let response = self.send(request, id).await?;
        Self::json(response).await
    }

    async fn update_content(&self, id: &DocumentId, update: &DraftUpdate) -> Result<(), ApiError> {
        let request = self.request(Method::PUT, self.url(id, &["content"])).json(update);
        self.send(request, id).await?;
        Ok(())
    }

    async fn publish(
        &self,
        id: &DocumentId,
        record: &PublishRecord,
    ) -> Result<DocumentResponse, ApiError> {
        let request = self.request(Method::POST, self.url(id, &["publish"])).json(record);
        let response = self.send(request, id).await?;
        Self::json(response).await
    }

    async fn download(&self, id: &DocumentId, format: DownloadFormat) -> Result<Download, ApiError> {
        let mut url = self.url(id, &["download"]);
        url.query_pairs_mut().append_pair("format", format.as_str());
        let response = self.send(self.request(Method::GET, url), id).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Download {
            format,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DocumentId {
        DocumentId::new("doc-1")
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, &id(), ""),
            ApiError::NotFound("doc-1".into())
        );
    }

    #[test]
    fn test_payment_required_shapes() {
        let flat = r#"{"reason": "no_credits", "message": "Buy credits", "payment_options": [{"type": "bundle"}]}"#;
        let wrapped = r#"{"detail": {"reason": "no_credits", "message": "Buy credits", "payment_options": [{"kind": "bundle"}]}}"#;

        for body in [flat, wrapped] {
            match error_for_status(StatusCode::PAYMENT_REQUIRED, &id(), body) {
                ApiError::PaymentRequired {
                    reason,
                    message,
                    payment_options,
                } => {
                    assert_eq!(reason, "no_credits");
                    assert_eq!(message, "Buy credits");
                    assert_eq!(payment_options[0].kind, "bundle");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_payment_required_without_body() {
        assert!(matches!(
            error_for_status(StatusCode::PAYMENT_REQUIRED, &id(), "nope"),
            ApiError::PaymentRequired { ref message, .. } if message == "Payment required"
        ));
    }

    #[test]
    fn test_other_status() {
        assert_eq!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, &id(), "boom"),
            ApiError::Status {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpDocumentApi::new(ClientConfig::new("http://localhost:8000/api/")).unwrap();
        assert_eq!(
            api.url(&id(), &["content"]).as_str(),
            "http://localhost:8000/api/documents/doc-1/content"
        );
    }

    #[test]
    fn test_document_id_is_one_path_segment() {
        let api = HttpDocumentApi::new(ClientConfig::new("http://localhost:8000/api")).unwrap();
        let odd = DocumentId::new("a/b?c#d");
        assert_eq!(
            api.url(&odd, &["content"]).as_str(),
            "http://localhost:8000/api/documents/a%2Fb%3Fc%23d/content"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpDocumentApi::new(ClientConfig::new("not a url")),
            Err(ApiError::Network(_))
        ));
    }
}
