use serde::{Deserialize, Serialize};

/// A domain record (e.g. a task) as seen by the deduplicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecordRef {
    pub record_id: String,
    /// Partition the record belongs to (user, workspace, meeting...).
    pub scope: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub origin_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    Exact,
    Similar,
    None,
}

/// A scored candidate returned by fuzzy matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMatch {
    pub record: DomainRecordRef,
    pub score: f64,
    pub title_score: f64,
    pub description_score: f64,
}

/// Verdict of a duplicate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub kind: DuplicateKind,
    pub confidence: f64,
    pub origin_hash: String,
    /// The record the candidate duplicates, when `kind != None`.
    pub existing: Option<DomainRecordRef>,
    /// Ranked similar matches above the similarity threshold.
    pub matches: Vec<SimilarMatch>,
}

impl DuplicateCheck {
    pub fn not_duplicate(origin_hash: String) -> Self {
        Self {
            kind: DuplicateKind::None,
            confidence: 0.0,
            origin_hash,
            existing: None,
            matches: Vec::new(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind != DuplicateKind::None
    }
}
