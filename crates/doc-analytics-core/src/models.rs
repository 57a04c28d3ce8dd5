//! Data types shared by the backend contract and the client-side caches.
//!
//! Field names follow the backend's JSON wire format, so every type here
//! deserializes straight from a response body. Fields the backend may omit
//! or send as `null` fall back to their defaults.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable backend identifier of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(DocumentId)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        DocumentId(id)
    }
}

/// One stored file as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub filename: String,
    /// Size of the stored file in bytes.
    pub file_size: u64,
    #[serde(default, with = "timestamp")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<String>,
    /// Category label; `None` until the backend has classified the document.
    #[serde(default)]
    pub classification: Option<String>,
    /// Classifier confidence in `[0.0, 1.0]`.
    #[serde(default)]
    pub classification_confidence: Option<f64>,
    #[serde(default, with = "timestamp")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Document {
    /// Minimal document with only the required attributes set.
    pub fn new(id: impl Into<DocumentId>, title: &str, filename: &str, file_size: u64) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            filename: filename.to_string(),
            file_size,
            upload_date: None,
            author: None,
            classification: None,
            classification_confidence: None,
            creation_date: None,
            last_modified: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }
}

/// How a search result matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The whole query matched as one contiguous phrase.
    ExactPhrase,
    /// Only some of the query's words matched, separately.
    IndividualWords,
    #[default]
    #[serde(other)]
    None,
}

impl MatchType {
    pub fn label(self) -> Option<&'static str> {
        match self {
            MatchType::ExactPhrase => Some("Exact phrase"),
            MatchType::IndividualWords => Some("Individual words"),
            MatchType::None => None,
        }
    }
}

/// Markup fragment rendered by the backend, e.g. `<mark>revenue</mark> grew`.
///
/// The backend is the trust boundary for this content. It is kept and handed
/// to the display surface exactly as received: never escaped, never parsed.
/// A surface that interprets markup must treat it as already sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustedMarkup(String);

impl TrustedMarkup {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TrustedMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One located occurrence of a search term inside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    /// 1-based line of the occurrence.
    pub line_number: u32,
    pub context_start_line: u32,
    pub context_end_line: u32,
    /// The literal token or phrase that matched.
    pub term: String,
    pub context: TrustedMarkup,
    /// Offset of the matched line inside the snippet, when the backend sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_line_in_context: Option<u32>,
}

impl MatchContext {
    /// `context_start_line <= line_number <= context_end_line`.
    pub fn is_well_formed(&self) -> bool {
        self.context_start_line <= self.line_number && self.line_number <= self.context_end_line
    }
}

/// A document plus its search-specific projection.
///
/// `total_matches` may exceed `match_contexts.len()` when the backend caps the
/// contexts it returns; navigation always uses `match_contexts.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default, deserialize_with = "null_as_default")]
    pub match_type: MatchType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matched_terms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_matches: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub match_contexts: Vec<MatchContext>,
    /// Whole-body highlight, shown when no contexts were returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_content: Option<TrustedMarkup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_title: Option<TrustedMarkup>,
}

impl SearchResult {
    pub fn id(&self) -> DocumentId {
        self.document.id
    }
}

/// One entry of the backend's search log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    #[serde(default)]
    pub id: Option<u64>,
    pub query: String,
    #[serde(default)]
    pub results_count: u64,
    /// Seconds.
    #[serde(default)]
    pub search_time: f64,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Aggregate snapshot of the document library.
///
/// Documents without a classification contribute to no entry of
/// `classification_distribution`, so its counts sum to at most
/// `total_documents`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub total_size_bytes: u64,
    #[serde(default)]
    pub total_size_mb: f64,
    /// Seconds.
    #[serde(default)]
    pub average_search_time: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classification_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_searches: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_searches: Vec<SearchLogEntry>,
}

/// Column the document library is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    UploadDate,
    Title,
    FileSize,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [SortBy::UploadDate, SortBy::Title, SortBy::FileSize];

    /// Value passed verbatim as the `sort_by` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::UploadDate => "upload_date",
            SortBy::Title => "title",
            SortBy::FileSize => "file_size",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown sort field '{}'. Use upload_date, title, or file_size.",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Value passed verbatim as the `sort_order` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'. Use asc or desc.", other)),
        }
    }
}

/// Ordering requested for a document list refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortParams {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl SortParams {
    pub fn new(sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            sort_by,
            sort_order,
        }
    }
}

/// A file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

// ============ Wire envelopes ============

/// `GET /documents` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<Document>,
    /// Seconds the backend spent ordering the list.
    #[serde(default)]
    pub sort_time: Option<f64>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// `POST /search` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub documents: Vec<SearchResult>,
    /// Seconds.
    #[serde(default)]
    pub search_time: Option<f64>,
    #[serde(default)]
    pub results_count: Option<u64>,
    #[serde(default)]
    pub total_documents: Option<u64>,
    #[serde(default)]
    pub query: Option<String>,
}

/// `POST /upload` success body. The backend may send anything on success,
/// so every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
}

/// `POST /classify` success body. Only `documents`, when present, feeds the
/// repository merge; the rest is informational.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassifyReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub classified_count: Option<u64>,
    /// Seconds.
    #[serde(default)]
    pub classification_time: Option<f64>,
    #[serde(default)]
    pub documents: Option<Vec<Document>>,
}

/// `GET /health` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// Structured error body sent with non-success statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a backend timestamp: RFC 3339, or a naive ISO 8601 value taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw))),
        }
    }
}
