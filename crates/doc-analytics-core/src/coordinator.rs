//! Sequencing of user-triggered operations.
//!
//! The [`Coordinator`] owns the three state holders (document repository,
//! search session, statistics view) and is the only thing that mutates them
//! in response to backend calls. Each operation follows the same shape:
//!
//! 1. Take a [`BusyGuard`] so [`Coordinator::is_busy`] reports work in flight.
//! 2. Lock the workspace, issue a ticket on the relevant holder, unlock.
//! 3. Await the backend call. No lock is held here.
//! 4. Lock again and settle the ticket: apply, discard as stale, or turn the
//!    error into a queued [`Notice`].
//!
//! Operations may overlap freely. Correctness under overlap comes from the
//! per-holder sequence gates, not from serialising requests.
//!
//! # Operations
//!
//! | Method | Backend calls | Holder |
//! |--------|---------------|--------|
//! | [`upload`](Coordinator::upload) | upload, then list + statistics concurrently | repository, statistics |
//! | [`search`](Coordinator::search) | search | session |
//! | [`set_sort_by`](Coordinator::set_sort_by) / [`set_sort_order`](Coordinator::set_sort_order) | list | repository |
//! | [`classify_all`](Coordinator::classify_all) | classify, list if needed, statistics | repository, statistics |
//! | [`refresh_statistics`](Coordinator::refresh_statistics) | statistics | statistics |
//! | [`fetch_document`](Coordinator::fetch_document) | get document | none |
//! | [`check_health`](Coordinator::check_health) | health | api status |

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{ClientError, Notice, Operation, Result};
use crate::models::{Document, DocumentId, SortBy, SortOrder, SortParams, Statistics, UploadFile};
use crate::repository::DocumentRepository;
use crate::session::{SearchSession, SessionEntry, Submission};
use crate::sequence::{Settled, Ticket};
use crate::statistics::{DistributionRow, StatisticsView};

/// How one coordinator operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was applied to local state.
    Applied,
    /// Empty input; no request was made and nothing changed.
    Skipped,
    /// A newer request of the same kind was issued meanwhile; the response
    /// was discarded.
    Superseded,
    /// The request failed. The notice has also been queued.
    Failed(Notice),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Outcome::Failed(notice) => Some(notice),
            _ => None,
        }
    }
}

/// Reachability of the backend as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ApiStatus {
    pub fn label(self) -> &'static str {
        match self {
            ApiStatus::Unknown => "unknown",
            ApiStatus::Connected => "connected",
            ApiStatus::Disconnected => "disconnected",
        }
    }
}

/// Read-only copy of the workspace, for rendering.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    pub documents: Vec<Document>,
    pub documents_loaded: bool,
    pub sort: SortParams,
    pub last_sort_time: Option<f64>,
    pub query: Option<String>,
    pub results: Vec<SessionEntry>,
    pub last_search_time: Option<f64>,
    pub statistics: Option<Statistics>,
    pub distribution: Vec<DistributionRow>,
    pub last_upload: Option<Document>,
    pub api_status: ApiStatus,
    pub busy: bool,
}

struct Workspace {
    repository: DocumentRepository,
    session: SearchSession,
    statistics: StatisticsView,
    notices: VecDeque<Notice>,
    api_status: ApiStatus,
    last_upload: Option<Document>,
}

impl Workspace {
    /// Any response at all means the backend is reachable.
    fn observe<T>(&mut self, result: &Result<T>) {
        self.api_status = match result {
            Err(ClientError::NetworkFailure(_)) => ApiStatus::Disconnected,
            _ => ApiStatus::Connected,
        };
    }

    fn fail(&mut self, operation: Operation, err: &ClientError) -> Outcome {
        warn!(kind = err.kind(), "{} failed: {}", operation, err);
        let notice = err.notice(operation);
        self.notices.push_back(notice.clone());
        Outcome::Failed(notice)
    }

    fn conclude(&mut self, operation: Operation, ticket: Ticket, settled: Result<Settled>) -> Outcome {
        match settled {
            Ok(Settled::Applied) => {
                debug!(ticket = ticket.seq(), "{} applied", operation);
                Outcome::Applied
            }
            Ok(Settled::Stale) => {
                debug!(ticket = ticket.seq(), "{}: discarding superseded response", operation);
                Outcome::Superseded
            }
            Err(err) => self.fail(operation, &err),
        }
    }
}

/// Marks one operation as in flight for as long as it is alive.
pub struct BusyGuard {
    counter: Arc<AtomicUsize>,
}

impl BusyGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drives backend operations against the local workspace.
pub struct Coordinator {
    backend: Arc<dyn Backend>,
    state: Mutex<Workspace>,
    in_flight: Arc<AtomicUsize>,
}

impl Coordinator {
    pub fn new(backend: Arc<dyn Backend>, sort: SortParams) -> Self {
        Self {
            backend,
            state: Mutex::new(Workspace {
                repository: DocumentRepository::new(sort),
                session: SearchSession::new(),
                statistics: StatisticsView::new(),
                notices: VecDeque::new(),
                api_status: ApiStatus::Unknown,
                last_upload: None,
            }),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn busy(&self) -> BusyGuard {
        BusyGuard::new(Arc::clone(&self.in_flight))
    }

    /// True while at least one operation is waiting on the backend.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn api_status(&self) -> ApiStatus {
        self.workspace().api_status
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.workspace().notices.drain(..).collect()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let ws = self.workspace();
        WorkspaceSnapshot {
            documents: ws.repository.documents().to_vec(),
            documents_loaded: ws.repository.has_loaded(),
            sort: ws.repository.sort(),
            last_sort_time: ws.repository.last_sort_time(),
            query: ws.session.query().map(str::to_string),
            results: ws.session.entries().to_vec(),
            last_search_time: ws.session.last_search_time(),
            statistics: ws.statistics.current().cloned(),
            distribution: ws.statistics.distribution(),
            last_upload: ws.last_upload.clone(),
            api_status: ws.api_status,
            busy: self.is_busy(),
        }
    }

    /// Upload `file`, then refresh the library and statistics.
    ///
    /// `None` (no file chosen) is skipped without a request. A rejected
    /// upload leaves every cache untouched. After a successful upload both
    /// refreshes run concurrently and settle independently; a failure of one
    /// is reported on its own and does not affect the other.
    pub async fn upload(&self, file: Option<UploadFile>) -> Outcome {
        let Some(file) = file else {
            debug!("upload skipped: no file selected");
            return Outcome::Skipped;
        };
        let _busy = self.busy();
        debug!(filename = %file.filename, bytes = file.bytes.len(), "uploading");
        let result = self.backend.upload(&file).await;

        {
            let mut ws = self.workspace();
            ws.observe(&result);
            match result {
                Ok(receipt) => {
                    info!(
                        "Uploaded {}: {}",
                        file.filename,
                        receipt.message.as_deref().unwrap_or("ok")
                    );
                    ws.last_upload = receipt.document;
                }
                Err(err) => return ws.fail(Operation::Upload, &err),
            }
        }

        let (documents, statistics) =
            futures::join!(self.refresh_documents(), self.refresh_statistics());
        debug!(?documents, ?statistics, "post-upload refreshes settled");
        Outcome::Applied
    }

    /// Search for `query`. A blank query is skipped and leaves the current
    /// results exactly as they were.
    pub async fn search(&self, query: &str) -> Outcome {
        let submission = self.workspace().session.begin_submit(query);
        let (ticket, query) = match submission {
            Submission::Skipped => {
                debug!("search skipped: blank query");
                return Outcome::Skipped;
            }
            Submission::Issued { ticket, query } => (ticket, query),
        };

        let _busy = self.busy();
        debug!(ticket = ticket.seq(), query = %query, "searching");
        let result = self.backend.search(&query).await;

        let mut ws = self.workspace();
        ws.observe(&result);
        if let Ok(response) = &result {
            info!("Search '{}' returned {} results", query, response.documents.len());
        }
        let settled = ws.session.settle_submit(ticket, &query, result);
        ws.conclude(Operation::Search, ticket, settled)
    }

    /// Drop the shown results. Searches still in flight will not repopulate
    /// them.
    pub fn clear_search(&self) {
        self.workspace().session.clear();
    }

    /// Change the sort field and refresh the library. Skipped when the field
    /// is unchanged.
    pub async fn set_sort_by(&self, sort_by: SortBy) -> Outcome {
        let changed = self.workspace().repository.set_sort_by(sort_by);
        if !changed {
            return Outcome::Skipped;
        }
        self.refresh_documents().await
    }

    /// Change the sort direction and refresh the library. Skipped when the
    /// direction is unchanged.
    pub async fn set_sort_order(&self, sort_order: SortOrder) -> Outcome {
        let changed = self.workspace().repository.set_sort_order(sort_order);
        if !changed {
            return Outcome::Skipped;
        }
        self.refresh_documents().await
    }

    /// Fetch the library with the current sort parameters.
    pub async fn refresh_documents(&self) -> Outcome {
        let _busy = self.busy();
        let (ticket, sort) = self.workspace().repository.begin_refresh();
        debug!(
            ticket = ticket.seq(),
            sort_by = %sort.sort_by,
            sort_order = %sort.sort_order,
            "requesting document list"
        );
        let result = self.backend.list_documents(sort).await;

        let mut ws = self.workspace();
        ws.observe(&result);
        let settled = ws.repository.settle_refresh(ticket, result);
        ws.conclude(Operation::RefreshDocuments, ticket, settled)
    }

    /// Classify every document, update the library, then refresh statistics.
    ///
    /// Labels returned with the response are merged into the cached library
    /// by id. When the backend only returns a summary, or the library has
    /// never loaded, the library is refetched instead.
    pub async fn classify_all(&self) -> Outcome {
        let _busy = self.busy();
        debug!("classifying all documents");
        let result = self.backend.classify_all().await;

        let classified = {
            let mut ws = self.workspace();
            ws.observe(&result);
            let receipt = match result {
                Ok(receipt) => receipt,
                Err(err) => return ws.fail(Operation::ClassifyAll, &err),
            };
            info!(
                count = receipt.classified_count,
                seconds = receipt.classification_time,
                "classification finished"
            );
            ws.notices
                .push_back(Notice::info("Documents classified successfully!"));
            match receipt.documents {
                Some(documents) if ws.repository.has_loaded() => {
                    let updated = ws.repository.apply_classification(&documents);
                    debug!("merged {} classification labels", updated);
                    true
                }
                Some(_) => {
                    debug!("library not loaded yet; refetching instead of merging");
                    false
                }
                None => false,
            }
        };

        if !classified {
            self.refresh_documents().await;
        }
        self.refresh_statistics().await;
        Outcome::Applied
    }

    pub async fn refresh_statistics(&self) -> Outcome {
        let _busy = self.busy();
        let ticket = self.workspace().statistics.begin_refresh();
        debug!(ticket = ticket.seq(), "requesting statistics");
        let result = self.backend.statistics().await;

        let mut ws = self.workspace();
        ws.observe(&result);
        let settled = ws.statistics.settle_refresh(ticket, result);
        ws.conclude(Operation::RefreshStatistics, ticket, settled)
    }

    /// Look up one document on the backend. Local caches are not touched;
    /// a failure is queued as a notice and yields `None`.
    pub async fn fetch_document(&self, id: DocumentId) -> Option<Document> {
        let _busy = self.busy();
        let result = self.backend.get_document(id).await;

        let mut ws = self.workspace();
        ws.observe(&result);
        match result {
            Ok(document) => Some(document),
            Err(err) => {
                ws.fail(Operation::FetchDocument, &err);
                None
            }
        }
    }

    /// Probe the backend and record whether it is reachable and healthy.
    /// Health failures only change the status; no notice is queued.
    pub async fn check_health(&self) -> ApiStatus {
        let _busy = self.busy();
        let result = self.backend.health().await;
        let status = match &result {
            Ok(health) if health.is_healthy() => ApiStatus::Connected,
            Ok(health) => {
                warn!("backend reports status '{}'", health.status);
                ApiStatus::Disconnected
            }
            Err(err) => {
                warn!(kind = err.kind(), "{} failed: {}", Operation::HealthCheck, err);
                ApiStatus::Disconnected
            }
        };
        self.workspace().api_status = status;
        status
    }

    /// Advance the navigator of result `id`; returns the new index.
    pub fn next_match(&self, id: DocumentId) -> Option<usize> {
        self.workspace()
            .session
            .navigator_mut(id)
            .and_then(|nav| nav.next())
    }

    /// Step the navigator of result `id` back; returns the new index.
    pub fn previous_match(&self, id: DocumentId) -> Option<usize> {
        self.workspace()
            .session
            .navigator_mut(id)
            .and_then(|nav| nav.previous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Endpoint, InMemoryBackend};

    fn coordinator(backend: InMemoryBackend) -> (Arc<InMemoryBackend>, Coordinator) {
        let backend = Arc::new(backend);
        let coordinator = Coordinator::new(backend.clone(), SortParams::default());
        (backend, coordinator)
    }

    #[tokio::test]
    async fn test_upload_without_file_is_skipped() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        assert_eq!(coord.upload(None).await, Outcome::Skipped);
        assert_eq!(backend.calls(Endpoint::Upload), 0);
        assert!(coord.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upload_reports_backend_message() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        let outcome = coord
            .upload(Some(UploadFile::new("notes.txt", b"x".to_vec())))
            .await;
        assert_eq!(
            outcome.notice().unwrap().message,
            "Upload failed: File type not allowed. Only PDF and DOCX files are supported."
        );
        assert_eq!(backend.calls(Endpoint::ListDocuments), 0);
        assert!(!coord.snapshot().documents_loaded);
        assert_eq!(coord.take_notices().len(), 1);
    }

    #[tokio::test]
    async fn test_statistics_failure_does_not_block_list_refresh() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        backend.fail(
            Endpoint::Statistics,
            ClientError::MalformedResponse("truncated".into()),
        );
        let outcome = coord
            .upload(Some(UploadFile::new("q1.pdf", vec![1, 2, 3])))
            .await;
        assert_eq!(outcome, Outcome::Applied);

        let snapshot = coord.snapshot();
        assert_eq!(snapshot.documents.len(), 1);
        assert!(snapshot.statistics.is_none());
        let notices = coord.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Loading statistics failed. Please try again.");
    }

    #[tokio::test]
    async fn test_list_failure_does_not_block_statistics_refresh() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        backend.fail(
            Endpoint::ListDocuments,
            ClientError::MalformedResponse("truncated".into()),
        );
        let outcome = coord
            .upload(Some(UploadFile::new("q1.pdf", vec![1, 2, 3])))
            .await;
        assert_eq!(outcome, Outcome::Applied);

        let snapshot = coord.snapshot();
        assert!(!snapshot.documents_loaded);
        assert_eq!(snapshot.statistics.unwrap().total_documents, 1);
        let notices = coord.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Loading documents failed. Please try again.");
    }

    #[tokio::test]
    async fn test_sort_change_refreshes_only_when_changed() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        assert_eq!(coord.set_sort_by(SortBy::UploadDate).await, Outcome::Skipped);
        assert_eq!(backend.calls(Endpoint::ListDocuments), 0);
        assert_eq!(coord.set_sort_by(SortBy::Title).await, Outcome::Applied);
        assert_eq!(coord.set_sort_order(SortOrder::Asc).await, Outcome::Applied);
        assert_eq!(backend.calls(Endpoint::ListDocuments), 2);
        assert_eq!(
            coord.snapshot().sort,
            SortParams::new(SortBy::Title, SortOrder::Asc)
        );
    }

    #[tokio::test]
    async fn test_network_failure_marks_disconnected() {
        let (backend, coord) = coordinator(InMemoryBackend::new());
        assert_eq!(coord.api_status(), ApiStatus::Unknown);
        backend.fail(
            Endpoint::ListDocuments,
            ClientError::NetworkFailure("refused".into()),
        );
        coord.refresh_documents().await;
        assert_eq!(coord.api_status(), ApiStatus::Disconnected);
        backend.recover(Endpoint::ListDocuments);
        assert_eq!(coord.check_health().await, ApiStatus::Connected);
    }

    #[tokio::test]
    async fn test_fetch_missing_document_queues_notice() {
        let (_, coord) = coordinator(InMemoryBackend::new());
        assert!(coord.fetch_document(DocumentId(3)).await.is_none());
        let notices = coord.take_notices();
        assert_eq!(
            notices[0].message,
            "Loading document failed: document 3 not found"
        );
    }
}
