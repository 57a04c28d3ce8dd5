//! In-memory [`Backend`] implementation for tests and offline use.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`. Search results are
//! scripted per query, since there is no text to search; an unscripted query
//! returns no results. Classification applies staged labels. Any endpoint can
//! be made to fail with a chosen [`ClientError`] until it is recovered, and
//! every call is counted so tests can assert that no request was made.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ClientError, Result};
use crate::models::{
    ClassifyReceipt, Document, DocumentId, DocumentList, HealthStatus, SearchLogEntry,
    SearchResponse, SearchResult, SortBy, SortOrder, SortParams, Statistics, UploadFile,
    UploadReceipt,
};

use super::Backend;

const ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

/// Backend endpoints, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListDocuments,
    Statistics,
    Upload,
    Search,
    Classify,
    GetDocument,
    Health,
}

/// In-memory backend for tests.
pub struct InMemoryBackend {
    documents: RwLock<Vec<Document>>,
    next_id: Mutex<u64>,
    scripted: RwLock<HashMap<String, Vec<SearchResult>>>,
    labels: RwLock<HashMap<DocumentId, (String, f64)>>,
    search_log: RwLock<Vec<SearchLogEntry>>,
    failures: RwLock<HashMap<Endpoint, ClientError>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    echo_classified: bool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            next_id: Mutex::new(1),
            scripted: RwLock::new(HashMap::new()),
            labels: RwLock::new(HashMap::new()),
            search_log: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            echo_classified: false,
        }
    }

    /// Seed the library. Later uploads get ids above the highest seeded id.
    pub fn with_documents(self, documents: Vec<Document>) -> Self {
        let highest = documents.iter().map(|d| d.id.0).max().unwrap_or(0);
        *lock(&self.next_id) = highest + 1;
        *write(&self.documents) = documents;
        self
    }

    /// Make `classify_all` return the documents it labelled, instead of only
    /// a summary.
    pub fn echo_classified(mut self, echo: bool) -> Self {
        self.echo_classified = echo;
        self
    }

    /// Results returned for `query` (matched after trimming).
    pub fn script_search(&self, query: &str, results: Vec<SearchResult>) {
        write(&self.scripted).insert(query.trim().to_string(), results);
    }

    /// Label applied to `id` by the next `classify_all`.
    pub fn stage_label(&self, id: DocumentId, label: &str, confidence: f64) {
        write(&self.labels).insert(id, (label.to_string(), confidence));
    }

    /// Fail every call to `endpoint` with `error` until [`recover`](Self::recover).
    pub fn fail(&self, endpoint: Endpoint, error: ClientError) {
        write(&self.failures).insert(endpoint, error);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        write(&self.failures).remove(&endpoint);
    }

    /// Number of requests received by `endpoint`, failed ones included.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        lock(&self.calls).get(&endpoint).copied().unwrap_or(0)
    }

    pub fn documents(&self) -> Vec<Document> {
        read(&self.documents).clone()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<()> {
        *lock(&self.calls).entry(endpoint).or_insert(0) += 1;
        match read(&self.failures).get(&endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn compare(a: &Document, b: &Document, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::UploadDate => a.upload_date.cmp(&b.upload_date),
        SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortBy::FileSize => a.file_size.cmp(&b.file_size),
    }
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list_documents(&self, sort: SortParams) -> Result<DocumentList> {
        self.enter(Endpoint::ListDocuments)?;
        let mut documents = read(&self.documents).clone();
        documents.sort_by(|a, b| {
            let ord = compare(a, b, sort.sort_by).then_with(|| a.id.cmp(&b.id));
            match sort.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        let total = documents.len() as u64;
        Ok(DocumentList {
            documents,
            sort_time: Some(0.0),
            total_count: Some(total),
        })
    }

    async fn statistics(&self) -> Result<Statistics> {
        self.enter(Endpoint::Statistics)?;
        let documents = read(&self.documents);
        let log = read(&self.search_log);

        let total_size_bytes: u64 = documents.iter().map(|d| d.file_size).sum();
        let mut distribution = std::collections::BTreeMap::new();
        for label in documents.iter().filter_map(|d| d.classification.as_ref()) {
            *distribution.entry(label.clone()).or_insert(0) += 1;
        }
        let average_search_time = if log.is_empty() {
            0.0
        } else {
            log.iter().map(|e| e.search_time).sum::<f64>() / log.len() as f64
        };

        Ok(Statistics {
            total_documents: documents.len() as u64,
            total_size_bytes,
            total_size_mb: total_size_bytes as f64 / (1024.0 * 1024.0),
            average_search_time,
            classification_distribution: distribution,
            total_searches: log.len() as u64,
            recent_searches: log.iter().rev().take(10).cloned().collect(),
        })
    }

    async fn upload(&self, file: &UploadFile) -> Result<UploadReceipt> {
        self.enter(Endpoint::Upload)?;
        if file.filename.trim().is_empty() {
            return Err(ClientError::BackendRejected {
                status: 400,
                message: "No file selected".into(),
            });
        }
        let allowed = extension(&file.filename)
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !allowed {
            return Err(ClientError::BackendRejected {
                status: 400,
                message: "File type not allowed. Only PDF and DOCX files are supported.".into(),
            });
        }

        let id = {
            let mut next = lock(&self.next_id);
            let id = *next;
            *next += 1;
            id
        };
        let title = file
            .filename
            .rsplit_once('.')
            .map_or(file.filename.as_str(), |(stem, _)| stem);
        let mut document = Document::new(id, title, &file.filename, file.bytes.len() as u64);
        document.upload_date = Some(Utc::now());
        write(&self.documents).push(document.clone());

        Ok(UploadReceipt {
            message: Some("File uploaded successfully".into()),
            document: Some(document),
        })
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        self.enter(Endpoint::Search)?;
        let query = query.trim();
        let results = read(&self.scripted).get(query).cloned().unwrap_or_default();
        write(&self.search_log).push(SearchLogEntry {
            id: None,
            query: query.to_string(),
            results_count: results.len() as u64,
            search_time: 0.0,
            timestamp: Some(Utc::now()),
        });
        Ok(SearchResponse {
            results_count: Some(results.len() as u64),
            total_documents: Some(read(&self.documents).len() as u64),
            query: Some(query.to_string()),
            search_time: Some(0.0),
            documents: results,
        })
    }

    async fn classify_all(&self) -> Result<ClassifyReceipt> {
        self.enter(Endpoint::Classify)?;
        let labels = std::mem::take(&mut *write(&self.labels));
        let mut classified = Vec::new();
        for document in write(&self.documents).iter_mut() {
            if let Some((label, confidence)) = labels.get(&document.id) {
                document.classification = Some(label.clone());
                document.classification_confidence = Some(*confidence);
                classified.push(document.clone());
            }
        }
        Ok(ClassifyReceipt {
            message: Some(format!("Classified {} documents", classified.len())),
            classified_count: Some(classified.len() as u64),
            classification_time: Some(0.0),
            documents: self.echo_classified.then_some(classified),
        })
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.enter(Endpoint::GetDocument)?;
        read(&self.documents)
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("document {}", id)))
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.enter(Endpoint::Health)?;
        Ok(HealthStatus {
            status: "healthy".into(),
            message: Some("in-memory backend".into()),
        })
    }
}
