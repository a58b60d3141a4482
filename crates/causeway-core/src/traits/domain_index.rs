use crate::errors::CausewayResult;
use crate::models::DomainRecordRef;

/// Lookup over domain records (tasks) by origin hash and scope.
pub trait IDomainRecordIndex: Send + Sync {
    fn find_by_origin_hash(
        &self,
        origin_hash: &str,
        scope: &str,
    ) -> CausewayResult<Option<DomainRecordRef>>;

    /// Most recent records in `scope`, used as fuzzy-match candidates.
    fn list_candidates(&self, scope: &str, limit: usize) -> CausewayResult<Vec<DomainRecordRef>>;

    fn register_domain_record(&self, record: &DomainRecordRef) -> CausewayResult<()>;
}
