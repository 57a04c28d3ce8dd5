//! Client-side cache of the document library.
//!
//! The cache always reflects exactly the most recently issued refresh that
//! completed successfully. Refreshes replace the list wholesale; there is no
//! incremental merge, so a partial or stale list is never shown after a
//! successful refresh. The only in-place update is
//! [`apply_classification`](DocumentRepository::apply_classification).

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Document, DocumentId, DocumentList, SortBy, SortOrder, SortParams};
use crate::sequence::{SequenceGate, Settled, Ticket};

#[derive(Debug, Clone)]
pub struct DocumentRepository {
    documents: Vec<Document>,
    sort: SortParams,
    gate: SequenceGate,
    loaded: bool,
    last_sort_time: Option<f64>,
}

impl DocumentRepository {
    pub fn new(sort: SortParams) -> Self {
        Self {
            documents: Vec::new(),
            sort,
            gate: SequenceGate::new(),
            loaded: false,
            last_sort_time: None,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// True once any refresh has been applied. Distinguishes "never loaded"
    /// from "loaded, zero documents".
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    pub fn sort(&self) -> SortParams {
        self.sort
    }

    /// Seconds the backend reported for ordering the current list.
    pub fn last_sort_time(&self) -> Option<f64> {
        self.last_sort_time
    }

    /// Returns true if the parameter changed.
    pub fn set_sort_by(&mut self, sort_by: SortBy) -> bool {
        let changed = self.sort.sort_by != sort_by;
        self.sort.sort_by = sort_by;
        changed
    }

    /// Returns true if the parameter changed.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> bool {
        let changed = self.sort.sort_order != sort_order;
        self.sort.sort_order = sort_order;
        changed
    }

    /// Tag a refresh with the current sort parameters.
    pub fn begin_refresh(&mut self) -> (Ticket, SortParams) {
        (self.gate.issue(), self.sort)
    }

    /// Settle a refresh response.
    ///
    /// Applies it only if `ticket` is the latest issued refresh. A failure of
    /// the latest refresh is returned and leaves the cache untouched; it is
    /// never treated as an empty list.
    pub fn settle_refresh(&mut self, ticket: Ticket, result: Result<DocumentList>) -> Result<Settled> {
        self.gate.settle(ticket, result, |list| {
            self.documents = dedup_by_id(list.documents);
            self.last_sort_time = list.sort_time;
            self.loaded = true;
        })
    }

    /// Merge classification labels by identifier.
    ///
    /// Cached documents absent from `classified` keep their previous state, and
    /// a listed document without a label is left as it was rather than
    /// cleared. Ids the cache does not know are ignored. Returns the number of
    /// cached documents updated.
    ///
    /// Refreshes issued before the merge were answered with pre-classification
    /// data, so they are superseded and will settle as stale.
    pub fn apply_classification(&mut self, classified: &[Document]) -> usize {
        self.gate.invalidate();
        let mut updated = 0;
        for incoming in classified {
            let Some(label) = incoming.classification.as_ref() else {
                continue;
            };
            if let Some(cached) = self.documents.iter_mut().find(|d| d.id == incoming.id) {
                cached.classification = Some(label.clone());
                cached.classification_confidence = incoming.classification_confidence;
                updated += 1;
            }
        }
        updated
    }
}

impl Default for DocumentRepository {
    fn default() -> Self {
        Self::new(SortParams::default())
    }
}

fn dedup_by_id(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::with_capacity(documents.len());
    documents
        .into_iter()
        .filter(|d| {
            let fresh = seen.insert(d.id);
            if !fresh {
                tracing::warn!(id = %d.id, "dropping duplicate document id from list response");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    fn list(docs: Vec<Document>) -> DocumentList {
        DocumentList {
            documents: docs,
            sort_time: Some(0.01),
            total_count: None,
        }
    }

    fn labelled(id: u64, title: &str, label: Option<&str>) -> Document {
        let mut doc = Document::new(id, title, &format!("{}.pdf", title), 100);
        doc.classification = label.map(str::to_string);
        doc.classification_confidence = label.map(|_| 0.9);
        doc
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let mut repo = DocumentRepository::default();
        let (t1, _) = repo.begin_refresh();
        repo.settle_refresh(t1, Ok(list(vec![labelled(1, "a", None), labelled(2, "b", None)])))
            .unwrap();
        let (t2, _) = repo.begin_refresh();
        repo.settle_refresh(t2, Ok(list(vec![labelled(3, "c", None)])))
            .unwrap();
        let ids: Vec<u64> = repo.documents().iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![3]);
        assert!(repo.has_loaded());
    }

    #[test]
    fn test_out_of_order_responses_keep_latest() {
        let mut repo = DocumentRepository::default();
        let (first, _) = repo.begin_refresh();
        let (second, _) = repo.begin_refresh();

        let applied = repo
            .settle_refresh(second, Ok(list(vec![labelled(2, "second", None)])))
            .unwrap();
        assert_eq!(applied, Settled::Applied);

        let stale = repo
            .settle_refresh(first, Ok(list(vec![labelled(1, "first", None)])))
            .unwrap();
        assert_eq!(stale, Settled::Stale);
        assert_eq!(repo.documents()[0].title, "second");
    }

    #[test]
    fn test_failure_leaves_cache_untouched() {
        let mut repo = DocumentRepository::default();
        let (t1, _) = repo.begin_refresh();
        repo.settle_refresh(t1, Ok(list(vec![labelled(1, "kept", None)])))
            .unwrap();

        let (t2, _) = repo.begin_refresh();
        let err = repo
            .settle_refresh(t2, Err(ClientError::NetworkFailure("refused".into())))
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.documents()[0].title, "kept");
    }

    #[test]
    fn test_failure_before_first_load_is_not_zero_documents() {
        let mut repo = DocumentRepository::default();
        let (t, _) = repo.begin_refresh();
        assert!(repo
            .settle_refresh(t, Err(ClientError::MalformedResponse("html".into())))
            .is_err());
        assert!(!repo.has_loaded());
    }

    #[test]
    fn test_begin_refresh_captures_sort() {
        let mut repo = DocumentRepository::default();
        assert!(repo.set_sort_by(SortBy::Title));
        assert!(!repo.set_sort_by(SortBy::Title));
        assert!(repo.set_sort_order(SortOrder::Asc));
        let (_, params) = repo.begin_refresh();
        assert_eq!(params, SortParams::new(SortBy::Title, SortOrder::Asc));
    }

    #[test]
    fn test_merge_preserves_unlisted() {
        let mut repo = DocumentRepository::default();
        let (t, _) = repo.begin_refresh();
        repo.settle_refresh(
            t,
            Ok(list(vec![labelled(1, "A", None), labelled(2, "B", Some("Report"))])),
        )
        .unwrap();

        let updated = repo.apply_classification(&[labelled(2, "B", Some("Invoice"))]);
        assert_eq!(updated, 1);
        assert_eq!(repo.get(DocumentId(1)).unwrap().classification, None);
        assert_eq!(
            repo.get(DocumentId(2)).unwrap().classification.as_deref(),
            Some("Invoice")
        );
    }

    #[test]
    fn test_merge_never_clears_or_adds() {
        let mut repo = DocumentRepository::default();
        let (t, _) = repo.begin_refresh();
        repo.settle_refresh(t, Ok(list(vec![labelled(1, "A", Some("Report"))])))
            .unwrap();

        let updated =
            repo.apply_classification(&[labelled(1, "A", None), labelled(9, "Z", Some("Memo"))]);
        assert_eq!(updated, 0);
        assert_eq!(repo.len(), 1);
        assert_eq!(
            repo.get(DocumentId(1)).unwrap().classification.as_deref(),
            Some("Report")
        );
    }

    #[test]
    fn test_merge_supersedes_earlier_refresh() {
        let mut repo = DocumentRepository::default();
        let (t1, _) = repo.begin_refresh();
        repo.settle_refresh(t1, Ok(list(vec![labelled(1, "A", None)])))
            .unwrap();

        let (before_merge, _) = repo.begin_refresh();
        repo.apply_classification(&[labelled(1, "A", Some("Invoice"))]);

        let settled = repo
            .settle_refresh(before_merge, Ok(list(vec![labelled(1, "A", None)])))
            .unwrap();
        assert_eq!(settled, Settled::Stale);
        assert_eq!(
            repo.get(DocumentId(1)).unwrap().classification.as_deref(),
            Some("Invoice")
        );

        let (after_merge, _) = repo.begin_refresh();
        let settled = repo
            .settle_refresh(after_merge, Ok(list(vec![labelled(1, "A", Some("Memo"))])))
            .unwrap();
        assert_eq!(settled, Settled::Applied);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut repo = DocumentRepository::default();
        let (t, _) = repo.begin_refresh();
        repo.settle_refresh(
            t,
            Ok(list(vec![labelled(1, "first", None), labelled(1, "again", None)])),
        )
        .unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.documents()[0].title, "first");
    }
}
