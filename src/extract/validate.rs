use crate::core::model::{ExtractedRecord, RecordStatus};

/// Finalize a record's status. OK needs at least one identity field
/// (account or proof id) plus a vote count; anything less is kept as
/// partial. Error records pass through untouched.
pub fn finalize(record: ExtractedRecord) -> ExtractedRecord {
    let status = match record.status {
        RecordStatus::Error => RecordStatus::Error,
        _ => {
            if record.has_identity() && record.vote_count.is_some() {
                RecordStatus::Ok
            } else {
                RecordStatus::Partial
            }
        }
    };
    ExtractedRecord { status, ..record }
}
