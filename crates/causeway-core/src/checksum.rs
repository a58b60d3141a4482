//! Integrity digests over event payloads.
//!
//! The digest is blake3 over a canonical JSON rendering: object keys sorted,
//! no insignificant whitespace. Identical payloads always produce identical
//! checksums regardless of field order in the source document.

use serde_json::Value;

use crate::errors::{CausewayResult, LedgerError};
use crate::models::{EventPayload, EventRecord};

/// Canonical JSON text for a value (sorted keys, compact).
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a string never fails.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hex blake3 digest of the canonical form of `value`.
pub fn checksum_value(value: &Value) -> String {
    blake3::hash(canonical_json(value).as_bytes())
        .to_hex()
        .to_string()
}

/// Checksum of a typed payload.
pub fn checksum(payload: &EventPayload) -> CausewayResult<String> {
    let value = serde_json::to_value(payload)?;
    Ok(checksum_value(&value))
}

/// Recompute a record's checksum and compare it with the stored one.
pub fn verify(record: &EventRecord) -> CausewayResult<bool> {
    Ok(checksum(&record.payload)? == record.checksum)
}

/// Like [`verify`], but a mismatch becomes `ChecksumMismatch`.
pub fn ensure_valid(record: &EventRecord) -> CausewayResult<()> {
    let computed = checksum(&record.payload)?;
    if computed != record.checksum {
        return Err(LedgerError::ChecksumMismatch {
            event_id: record.id,
            stored: record.checksum.clone(),
            computed,
        }
        .into());
    }
    Ok(())
}
