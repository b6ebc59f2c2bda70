use std::collections::HashSet;

use tracing::debug;

use crate::core::model::{ExtractedRecord, KeyStrategy};

/// Pick the deduplication key for the whole batch, once. Proof ids are the
/// preferred evidence of "one proof = one vote event"; a single record
/// carrying one switches the entire batch to proof-id keying.
pub fn choose_strategy(records: &[ExtractedRecord]) -> KeyStrategy {
    let strategy = if records.iter().any(|r| r.proof_id.is_some()) {
        KeyStrategy::ProofId
    } else {
        KeyStrategy::Account
    };
    debug!(?strategy, "deduplication key strategy");
    strategy
}

/// Keep the first record (in original upload order) for each distinct key
/// value. Records whose key field is null never collide with each other:
/// under proof-id keying a record without a proof id is its own event.
pub fn dedup_records(records: &[ExtractedRecord], strategy: KeyStrategy) -> Vec<ExtractedRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept = Vec::new();

    for record in records {
        let key = match strategy {
            KeyStrategy::ProofId => record.proof_id.as_deref(),
            KeyStrategy::Account => record.account.as_deref(),
        };
        match key {
            Some(value) => {
                if seen.insert(value) {
                    kept.push(record.clone());
                }
            }
            None => kept.push(record.clone()),
        }
    }

    kept
}
