//! Per-result cyclic navigation over match contexts.
//!
//! A [`MatchNavigator`] is built from one [`SearchResult`] and is either
//! *empty* (no contexts) or *positioned* at an index in `[0, N)`. `next` and
//! `previous` wrap around, so there is no out-of-range state and no "end"
//! sentinel. With a single context both moves are the identity.
//!
//! Navigators are purely local: they hold a copy of the contexts supplied at
//! construction and never talk to the backend.

use crate::models::{MatchContext, SearchResult};

/// Index into a fixed-size sequence that wraps in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursor {
    len: usize,
    index: usize,
}

impl RingCursor {
    /// A cursor at index 0, or `None` for an empty sequence.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { len, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based position for display.
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    /// Never zero.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    pub fn previous(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }

    /// Jump to `index`, wrapped into range.
    pub fn go_to(&mut self, index: usize) -> usize {
        self.index = index % self.len;
        self.index
    }
}

/// Cursor over one search result's match contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchNavigator {
    contexts: Vec<MatchContext>,
    total_matches: u64,
    cursor: Option<RingCursor>,
}

impl MatchNavigator {
    pub fn new(result: &SearchResult) -> Self {
        Self::from_contexts(result.match_contexts.clone(), result.total_matches)
    }

    pub fn from_contexts(contexts: Vec<MatchContext>, total_matches: u64) -> Self {
        let cursor = RingCursor::new(contexts.len());
        Self {
            contexts,
            total_matches,
            cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }

    /// Number of navigable contexts (N).
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Current index, `None` when empty.
    pub fn position(&self) -> Option<usize> {
        self.cursor.map(|c| c.index())
    }

    pub fn current(&self) -> Option<&MatchContext> {
        self.cursor.map(|c| &self.contexts[c.index()])
    }

    pub fn contexts(&self) -> &[MatchContext] {
        &self.contexts
    }

    /// Advance with wrap-around. No-op when empty.
    pub fn next(&mut self) -> Option<usize> {
        self.cursor.as_mut().map(RingCursor::next)
    }

    /// Step back with wrap-around. No-op when empty.
    pub fn previous(&mut self) -> Option<usize> {
        self.cursor.as_mut().map(RingCursor::previous)
    }

    pub fn go_to(&mut self, index: usize) -> Option<usize> {
        self.cursor.as_mut().map(|c| c.go_to(index))
    }

    /// Whether next/previous controls are worth offering (N > 1).
    pub fn shows_controls(&self) -> bool {
        self.contexts.len() > 1
    }

    /// The count shown to the user: the backend's `total_matches`, which may
    /// exceed the number of contexts it returned, but never less than N.
    pub fn display_total(&self) -> u64 {
        self.total_matches.max(self.contexts.len() as u64)
    }

    /// "Match i of T", or `None` when empty.
    pub fn label(&self) -> Option<String> {
        self.cursor
            .map(|c| format!("Match {} of {}", c.ordinal(), self.display_total()))
    }
}
