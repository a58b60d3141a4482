//! Duplicate checks against the domain record index.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use causeway_core::config::DedupConfig;
use causeway_core::errors::CausewayResult;
use causeway_core::models::{DomainRecordRef, DuplicateCheck, DuplicateKind, SimilarMatch};
use causeway_core::traits::IDomainRecordIndex;

use crate::hash::origin_hash;
use crate::normalize::normalize;
use crate::similarity;

pub struct Deduplicator {
    index: Arc<dyn IDomainRecordIndex>,
    config: DedupConfig,
}

impl Deduplicator {
    pub fn new(index: Arc<dyn IDomainRecordIndex>, config: DedupConfig) -> Self {
        Self { index, config }
    }

    pub fn origin_hash(&self, title: &str, description: &str, assignee: Option<&str>) -> String {
        origin_hash(title, description, assignee)
    }

    /// Existing record in `scope` with the same origin hash.
    pub fn find_exact_duplicate(
        &self,
        hash: &str,
        scope: &str,
    ) -> CausewayResult<Option<DomainRecordRef>> {
        self.index.find_by_origin_hash(hash, scope)
    }

    /// Candidates in `scope` scoring at least the similarity threshold,
    /// best first, at most `limit`.
    pub fn find_similar(
        &self,
        title: &str,
        description: &str,
        scope: &str,
        limit: usize,
    ) -> CausewayResult<Vec<SimilarMatch>> {
        let title = normalize(title);
        let description = normalize(description);
        let candidates = self.index.list_candidates(scope, self.config.candidate_limit)?;

        let mut matches: Vec<SimilarMatch> = candidates
            .into_iter()
            .filter_map(|record| {
                let score = similarity::weighted(
                    &title,
                    &description,
                    &normalize(&record.title),
                    &normalize(&record.description),
                    self.config.title_weight,
                    self.config.description_weight,
                );
                (score.total >= self.config.similarity_threshold).then(|| SimilarMatch {
                    record,
                    score: score.total,
                    title_score: score.title,
                    description_score: score.description,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);
        Ok(matches)
    }

    /// Exact hash match first, then fuzzy matching.
    ///
    /// Never fails: if the index cannot be read the candidate is reported as
    /// not a duplicate, so a storage hiccup never blocks legitimate creation.
    #[instrument(skip(self, description))]
    pub fn check_duplicate(
        &self,
        title: &str,
        description: &str,
        assignee: Option<&str>,
        scope: &str,
    ) -> DuplicateCheck {
        let hash = origin_hash(title, description, assignee);
        match self.try_check(title, description, scope, hash.clone()) {
            Ok(check) => {
                debug!(kind = ?check.kind, confidence = check.confidence, "duplicate check");
                check
            }
            Err(e) => {
                warn!(error = %e, "duplicate check failed, treating as not a duplicate");
                DuplicateCheck::not_duplicate(hash)
            }
        }
    }

    fn try_check(
        &self,
        title: &str,
        description: &str,
        scope: &str,
        hash: String,
    ) -> CausewayResult<DuplicateCheck> {
        if let Some(existing) = self.find_exact_duplicate(&hash, scope)? {
            return Ok(DuplicateCheck {
                kind: DuplicateKind::Exact,
                confidence: 1.0,
                origin_hash: hash,
                existing: Some(existing),
                matches: Vec::new(),
            });
        }

        let matches = self.find_similar(title, description, scope, self.config.candidate_limit)?;
        let best = matches
            .first()
            .filter(|m| m.score >= self.config.duplicate_threshold)
            .cloned();

        Ok(match best {
            Some(top) => DuplicateCheck {
                kind: DuplicateKind::Similar,
                confidence: top.score,
                origin_hash: hash,
                existing: Some(top.record),
                matches,
            },
            None => DuplicateCheck {
                matches,
                ..DuplicateCheck::not_duplicate(hash)
            },
        })
    }

    /// Compute the origin hash and add the record to the index.
    pub fn register(
        &self,
        record_id: &str,
        scope: &str,
        title: &str,
        description: &str,
        assignee: Option<&str>,
    ) -> CausewayResult<DomainRecordRef> {
        let record = DomainRecordRef {
            record_id: record_id.to_string(),
            scope: scope.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            assignee: assignee.map(str::to_string),
            origin_hash: origin_hash(title, description, assignee),
        };
        self.index.register_domain_record(&record)?;
        Ok(record)
    }
}
