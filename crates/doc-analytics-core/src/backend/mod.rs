//! Backend abstraction for the document-analytics service.
//!
//! The [`Backend`] trait is the client's whole view of the external service
//! that stores, searches and classifies documents. The coordinator only ever
//! talks to a `dyn Backend`, so the HTTP client in the application crate and
//! the [`memory::InMemoryBackend`] used in tests are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ClassifyReceipt, Document, DocumentId, DocumentList, HealthStatus, SearchResponse,
    SortParams, Statistics, UploadFile, UploadReceipt,
};

/// Remote document-analytics service.
///
/// Every method is one request and one suspension point. Errors are already
/// classified into [`ClientError`](crate::error::ClientError) kinds.
///
/// # Operations
///
/// | Method | Request |
/// |--------|---------|
/// | [`list_documents`](Backend::list_documents) | `GET /documents?sort_by=&sort_order=` |
/// | [`statistics`](Backend::statistics) | `GET /statistics` |
/// | [`upload`](Backend::upload) | `POST /upload` (multipart field `file`) |
/// | [`search`](Backend::search) | `POST /search` with `{ "keywords": .. }` |
/// | [`classify_all`](Backend::classify_all) | `POST /classify` |
/// | [`get_document`](Backend::get_document) | `GET /document/<id>` |
/// | [`health`](Backend::health) | `GET /health` |
#[async_trait]
pub trait Backend: Send + Sync {
    /// The whole library in the requested order.
    async fn list_documents(&self, sort: SortParams) -> Result<DocumentList>;

    async fn statistics(&self) -> Result<Statistics>;

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt>;

    /// Search with a non-blank, trimmed query.
    async fn search(&self, query: &str) -> Result<SearchResponse>;

    /// Classify every stored document.
    async fn classify_all(&self) -> Result<ClassifyReceipt>;

    /// One document by id. A missing document is
    /// [`ClientError::NotFound`](crate::error::ClientError::NotFound).
    async fn get_document(&self, id: DocumentId) -> Result<Document>;

    async fn health(&self) -> Result<HealthStatus>;
}
