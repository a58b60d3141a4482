//! Origin hashes: content-derived identity for domain records.

use causeway_core::constants::ORIGIN_HASH_SEPARATOR;

use crate::normalize::normalize;

/// Hex blake3 digest of the normalized title and description, plus the
/// assignee when one is given. A blank assignee counts as none.
///
/// ```
/// use causeway_dedup::origin_hash;
///
/// assert_eq!(
///     origin_hash("Clean Bedroom", "", None),
///     origin_hash("clean   bedroom", "", None),
/// );
/// ```
pub fn origin_hash(title: &str, description: &str, assignee: Option<&str>) -> String {
    let mut material = normalize(title);
    material.push_str(ORIGIN_HASH_SEPARATOR);
    material.push_str(&normalize(description));

    if let Some(assignee) = assignee.map(str::trim).filter(|a| !a.is_empty()) {
        material.push_str(ORIGIN_HASH_SEPARATOR);
        material.push_str(&assignee.to_lowercase());
    }

    blake3::hash(material.as_bytes()).to_hex().to_string()
}
