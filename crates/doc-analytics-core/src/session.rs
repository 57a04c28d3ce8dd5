//! The current query and its result set.
//!
//! Results are replaced only when the latest issued search settles
//! successfully, so earlier results stay visible while a request is in
//! flight. Every applied result set seeds brand-new [`MatchNavigator`]s; a
//! document appearing in two consecutive searches starts again at its first
//! match.

use crate::error::Result;
use crate::models::{DocumentId, SearchResponse, SearchResult};
use crate::navigator::MatchNavigator;
use crate::sequence::{SequenceGate, Settled, Ticket};

/// One search result together with its private navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub result: SearchResult,
    pub navigator: MatchNavigator,
}

impl SessionEntry {
    fn new(result: SearchResult) -> Self {
        let navigator = MatchNavigator::new(&result);
        Self { result, navigator }
    }

    pub fn id(&self) -> DocumentId {
        self.result.id()
    }
}

/// What [`SearchSession::begin_submit`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank query. Nothing was issued and nothing changed.
    Skipped,
    /// A request should be sent for `query` (already trimmed).
    Issued { ticket: Ticket, query: String },
}

#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: Option<String>,
    entries: Vec<SessionEntry>,
    gate: SequenceGate,
    last_search_time: Option<f64>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query of the result set currently shown, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn results(&self) -> impl Iterator<Item = &SearchResult> {
        self.entries.iter().map(|e| &e.result)
    }

    pub fn entry(&self, id: DocumentId) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn navigator_mut(&mut self, id: DocumentId) -> Option<&mut MatchNavigator> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == id)
            .map(|e| &mut e.navigator)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seconds the backend reported for the shown result set.
    pub fn last_search_time(&self) -> Option<f64> {
        self.last_search_time
    }

    pub fn begin_submit(&mut self, query: &str) -> Submission {
        let query = query.trim();
        if query.is_empty() {
            return Submission::Skipped;
        }
        Submission::Issued {
            ticket: self.gate.issue(),
            query: query.to_string(),
        }
    }

    /// Settle the response to a submitted `query`.
    ///
    /// A current failure leaves the previous results in place.
    pub fn settle_submit(
        &mut self,
        ticket: Ticket,
        query: &str,
        result: Result<SearchResponse>,
    ) -> Result<Settled> {
        self.gate.settle(ticket, result, |response| {
            self.entries = response.documents.into_iter().map(SessionEntry::new).collect();
            self.query = Some(query.to_string());
            self.last_search_time = response.search_time;
        })
    }

    /// Drop the shown results locally. Searches still in flight are
    /// superseded and will not repopulate the session.
    pub fn clear(&mut self) {
        self.gate.invalidate();
        self.entries.clear();
        self.query = None;
        self.last_search_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::models::{Document, MatchContext, MatchType, TrustedMarkup};

    fn hit(id: u64, lines: &[u32]) -> SearchResult {
        SearchResult {
            document: Document::new(id, "Q1", "q1.pdf", 10),
            match_type: MatchType::ExactPhrase,
            matched_terms: vec!["revenue".into()],
            total_matches: lines.len() as u64,
            match_contexts: lines
                .iter()
                .map(|&line| MatchContext {
                    line_number: line,
                    context_start_line: line,
                    context_end_line: line,
                    term: "revenue".into(),
                    context: TrustedMarkup::new("<mark>revenue</mark>"),
                    match_line_in_context: None,
                })
                .collect(),
            highlighted_content: None,
            highlighted_title: None,
        }
    }

    fn response(results: Vec<SearchResult>) -> SearchResponse {
        SearchResponse {
            documents: results,
            search_time: Some(0.002),
            results_count: None,
            total_documents: None,
            query: None,
        }
    }

    fn issued(session: &mut SearchSession, query: &str) -> (Ticket, String) {
        match session.begin_submit(query) {
            Submission::Issued { ticket, query } => (ticket, query),
            Submission::Skipped => panic!("expected a request for {:?}", query),
        }
    }

    #[test]
    fn test_blank_query_is_skipped_and_keeps_results() {
        let mut session = SearchSession::new();
        let (t, q) = issued(&mut session, "revenue");
        session
            .settle_submit(t, &q, Ok(response(vec![hit(1, &[3])])))
            .unwrap();

        assert_eq!(session.begin_submit("   "), Submission::Skipped);
        assert_eq!(session.begin_submit(""), Submission::Skipped);
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.query(), Some("revenue"));
    }

    #[test]
    fn test_query_is_trimmed() {
        let mut session = SearchSession::new();
        let (_, q) = issued(&mut session, "  net revenue ");
        assert_eq!(q, "net revenue");
    }

    #[test]
    fn test_results_stay_visible_until_settled() {
        let mut session = SearchSession::new();
        let (t1, q1) = issued(&mut session, "revenue");
        session
            .settle_submit(t1, &q1, Ok(response(vec![hit(1, &[3])])))
            .unwrap();

        let (t2, q2) = issued(&mut session, "profit");
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.query(), Some("revenue"));

        session.settle_submit(t2, &q2, Ok(response(vec![]))).unwrap();
        assert!(session.is_empty());
        assert_eq!(session.query(), Some("profit"));
    }

    #[test]
    fn test_overlapping_submits_keep_latest() {
        let mut session = SearchSession::new();
        let (t1, q1) = issued(&mut session, "rev");
        let (t2, q2) = issued(&mut session, "revenue");

        assert!(session
            .settle_submit(t2, &q2, Ok(response(vec![hit(2, &[1])])))
            .unwrap()
            .is_applied());
        assert_eq!(
            session
                .settle_submit(t1, &q1, Ok(response(vec![hit(1, &[1])])))
                .unwrap(),
            Settled::Stale
        );
        assert!(session.entry(DocumentId(2)).is_some());
        assert!(session.entry(DocumentId(1)).is_none());
    }

    #[test]
    fn test_failure_preserves_results() {
        let mut session = SearchSession::new();
        let (t1, q1) = issued(&mut session, "revenue");
        session
            .settle_submit(t1, &q1, Ok(response(vec![hit(1, &[3])])))
            .unwrap();

        let (t2, q2) = issued(&mut session, "profit");
        let err = session
            .settle_submit(t2, &q2, Err(ClientError::NetworkFailure("timeout".into())))
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.query(), Some("revenue"));
    }

    #[test]
    fn test_navigators_are_fresh_per_search() {
        let mut session = SearchSession::new();
        let (t1, q1) = issued(&mut session, "revenue");
        session
            .settle_submit(t1, &q1, Ok(response(vec![hit(1, &[3, 8, 20])])))
            .unwrap();
        session.navigator_mut(DocumentId(1)).unwrap().next();
        assert_eq!(
            session.entry(DocumentId(1)).unwrap().navigator.position(),
            Some(1)
        );

        let (t2, q2) = issued(&mut session, "revenue");
        session
            .settle_submit(t2, &q2, Ok(response(vec![hit(1, &[3, 8, 20])])))
            .unwrap();
        assert_eq!(
            session.entry(DocumentId(1)).unwrap().navigator.position(),
            Some(0)
        );
    }

    #[test]
    fn test_clear_supersedes_in_flight() {
        let mut session = SearchSession::new();
        let (t, q) = issued(&mut session, "revenue");
        session.clear();
        let settled = session
            .settle_submit(t, &q, Ok(response(vec![hit(1, &[1])])))
            .unwrap();
        assert_eq!(settled, Settled::Stale);
        assert!(session.is_empty());
        assert_eq!(session.query(), None);
    }
}
