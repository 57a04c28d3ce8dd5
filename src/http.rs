//! HTTP implementation of [`Backend`] on top of `reqwest`.
//!
//! Every endpoint lives under the configured base URL (default
//! `http://localhost:5000/api`). Responses are mapped onto
//! [`ClientError`] kinds as follows:
//!
//! | Situation | Error |
//! |-----------|-------|
//! | Connection refused, timeout, body read failure | `NetworkFailure` |
//! | 2xx whose body is not the expected JSON | `MalformedResponse` |
//! | Non-2xx with `{ "error": "..." }` | `BackendRejected` |
//! | Non-2xx without a structured error | `MalformedResponse` |
//! | 404 on `GET /document/<id>` | `NotFound` |
//!
//! Upload and classify accept any 2xx body: a body that does not parse
//! becomes an empty receipt rather than an error.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use doc_analytics_core::backend::Backend;
use doc_analytics_core::error::{ClientError, Result};
use doc_analytics_core::models::{
    ClassifyReceipt, Document, DocumentId, DocumentList, ErrorBody, HealthStatus,
    SearchResponse, SortParams, Statistics, UploadFile, UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::BackendConfig;

/// `GET /document/<id>` wraps the document in an envelope.
#[derive(Deserialize)]
struct DocumentEnvelope {
    document: Document,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("dax/{}", env!("CARGO_PKG_VERSION")));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))
}

/// Read the body and split on status. Returns the raw body of a 2xx
/// response; `not_found` names the resource for a 404.
async fn read_body(response: Response, not_found: Option<String>) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    debug!(status = status.as_u16(), bytes = body.len(), "response received");

    if status.is_success() {
        return Ok(body);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(what) = not_found {
            return Err(ClientError::NotFound(what));
        }
    }
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => Err(ClientError::BackendRejected {
            status: status.as_u16(),
            message: err.error,
        }),
        Err(_) => Err(ClientError::MalformedResponse(format!(
            "HTTP {} without an error message",
            status
        ))),
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

/// Parse a body the backend is free to shape as it likes.
fn parse_lenient<T: DeserializeOwned + Default>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_else(|e| {
        debug!("ignoring unparseable success body: {}", e);
        T::default()
    })
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let body = read_body(send(request).await?, None).await?;
    parse(&body)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_documents(&self, sort: SortParams) -> Result<DocumentList> {
        debug!("GET /documents sort_by={} sort_order={}", sort.sort_by, sort.sort_order);
        let request = self.client.get(self.url("/documents")).query(&[
            ("sort_by", sort.sort_by.as_str()),
            ("sort_order", sort.sort_order.as_str()),
        ]);
        fetch(request).await
    }

    async fn statistics(&self) -> Result<Statistics> {
        debug!("GET /statistics");
        fetch(self.client.get(self.url("/statistics"))).await
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt> {
        debug!("POST /upload {} ({} bytes)", file.filename, file.bytes.len());
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|e| {
                ClientError::NetworkFailure(format!("invalid content type '{}': {}", content_type, e))
            })?;
        }
        let form = Form::new().part("file", part);
        let request = self.client.post(self.url("/upload")).multipart(form);
        let body = read_body(send(request).await?, None).await?;
        Ok(parse_lenient(&body))
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        debug!("POST /search keywords={:?}", query);
        let request = self
            .client
            .post(self.url("/search"))
            .json(&json!({ "keywords": query }));
        fetch(request).await
    }

    async fn classify_all(&self) -> Result<ClassifyReceipt> {
        debug!("POST /classify");
        let body = read_body(send(self.client.post(self.url("/classify"))).await?, None).await?;
        Ok(parse_lenient(&body))
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document> {
        debug!("GET /document/{}", id);
        let request = self.client.get(self.url(&format!("/document/{}", id)));
        let body = read_body(send(request).await?, Some(format!("document {}", id))).await?;
        parse::<DocumentEnvelope>(&body).map(|envelope| envelope.document)
    }

    async fn health(&self) -> Result<HealthStatus> {
        debug!("GET /health");
        fetch(self.client.get(self.url("/health"))).await
    }
}

/// Content type sent for a file, by extension.
pub fn content_type_for(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

/// Read a local file into an [`UploadFile`].
///
/// The extension is not checked here; the backend decides what it accepts.
pub async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    let file = UploadFile::new(filename.clone(), bytes);
    Ok(match content_type_for(&filename) {
        Some(content_type) => file.with_content_type(content_type),
        None => file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:5000/api/".into(),
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(backend.url("/health"), "http://localhost:5000/api/health");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("Q1.PDF"), Some("application/pdf"));
        assert!(content_type_for("memo.docx").unwrap().contains("wordprocessingml"));
        assert_eq!(content_type_for("notes.txt"), None);
        assert_eq!(content_type_for("README"), None);
    }

    #[test]
    fn test_lenient_parse_falls_back() {
        let receipt: UploadReceipt = parse_lenient("<html>ok</html>");
        assert_eq!(receipt, UploadReceipt::default());
        let receipt: ClassifyReceipt =
            parse_lenient(r#"{"message":"done","classified_count":3,"classification_time":0.4}"#);
        assert_eq!(receipt.classified_count, Some(3));
        assert!(receipt.documents.is_none());
    }

    #[tokio::test]
    async fn test_read_upload_sets_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let file = read_upload(&path).await.unwrap();
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.bytes, b"%PDF-1.4");
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    }
}
