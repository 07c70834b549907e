// [libs/core/hash-chain/src/canonical.rs]
/*!
 * APARATO: CANONICAL PAYLOAD ENCODER
 * CLASIFICACIÓN: CORE PURE FUNCTIONS (ESTRATO L1)
 * RESPONSABILIDAD: SERIALIZACIÓN DETERMINISTA DE ENTRADAS DEL LEDGER
 *
 * Every field that contributes to an entry's identity gets encoded in a
 * fixed order so two processes hashing the same logical entry always
 * agree on `payload_hash`, independent of map iteration order or struct
 * field order upstream.
 */

use std::collections::BTreeMap;

/// Sentinel used in the canonical string for an absent optional field.
/// Keeping this explicit (rather than simply omitting the field) means a
/// present-but-empty value can never collide with an absent one.
const ABSENT: &str = "-";

/// Minimal, hash-relevant projection of a ledger entry. `libs/domain/models`
/// constructs one of these from a `LedgerEntry` before hashing; this crate
/// never depends on the domain model directly so the hashing core stays
/// free of cross-cutting concerns.
#[derive(Debug, Clone)]
pub struct CanonicalEntry {
    pub entry_id: String,
    pub block_index: u64,
    pub event_type: String,
    pub severity: String,
    pub subject_id: String,
    pub passport_id: Option<String>,
    pub institution_id: Option<String>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    /// Arbitrary structured metadata, sorted by key for determinism.
    pub metadata: BTreeMap<String, String>,
    pub ip_hash: String,
    pub region: Option<String>,
    pub timestamp: String,
    pub sequence: u64,
}

/// Produces the canonical string form of an entry, covering every
/// non-hash field in a fixed order:
/// entry_id, block_index, event_type, severity, subject_id, passport_id
/// (or sentinel), institution_id (or sentinel), target_id/type (or
/// sentinel), metadata sorted by key, ip_hash, region (or sentinel),
/// timestamp, sequence.
pub fn canonicalize(entry: &CanonicalEntry) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(12 + entry.metadata.len());

    parts.push(entry.entry_id.clone());
    parts.push(entry.block_index.to_string());
    parts.push(entry.event_type.clone());
    parts.push(entry.severity.clone());
    parts.push(entry.subject_id.clone());
    parts.push(entry.passport_id.clone().unwrap_or_else(|| ABSENT.to_string()));
    parts.push(entry.institution_id.clone().unwrap_or_else(|| ABSENT.to_string()));
    parts.push(entry.target_id.clone().unwrap_or_else(|| ABSENT.to_string()));
    parts.push(entry.target_type.clone().unwrap_or_else(|| ABSENT.to_string()));

    let metadata_block = if entry.metadata.is_empty() {
        ABSENT.to_string()
    } else {
        entry
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    };
    parts.push(metadata_block);

    parts.push(entry.ip_hash.clone());
    parts.push(entry.region.clone().unwrap_or_else(|| ABSENT.to_string()));
    parts.push(entry.timestamp.clone());
    parts.push(entry.sequence.to_string());

    parts.join(":")
}
