use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

/// One unit of text recognized by the OCR engine from an image region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: None,
            confidence: None,
        }
    }
}

/// Ordered OCR output for one image. Order is as emitted by the engine;
/// downstream extraction relies on adjacency between fragments.
pub type FragmentSet = Vec<Fragment>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Identity (account or proof id) and vote count both extracted.
    Ok,
    /// Kept and shown, but missing fields exclude it from aggregation.
    Partial,
    /// OCR or decoding failed for the source image.
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "OK",
            RecordStatus::Partial => "PARTIAL",
            RecordStatus::Error => "ERROR",
        }
    }
}

/// Structured result of extracting one image. Immutable once built;
/// passes that change a record produce a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedRecord {
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ExtractedRecord {
    /// Record for an image whose OCR call failed; only the source id and
    /// the failure description survive.
    pub fn failed(source_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            account: None,
            proof_id: None,
            vote_count: None,
            date: None,
            status: RecordStatus::Error,
            error: Some(error.into()),
            raw_text: None,
        }
    }

    pub fn has_identity(&self) -> bool {
        self.account.is_some() || self.proof_id.is_some()
    }
}

/// Which field keys deduplication for the whole batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    ProofId,
    Account,
}

/// Per-account vote total, in first-seen account order. A null account is
/// an explicit group of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub total_votes: u64,
}

/// Everything one run produced: the per-image diagnostic records plus the
/// deduplicated, aggregated summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub records: Vec<ExtractedRecord>,
    pub summary: Vec<SummaryRow>,
    pub grand_total: u64,
    pub key_strategy: KeyStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_record_keeps_only_source_and_error() {
        let record = ExtractedRecord::failed("shot_01.png", "bridge exited with status 1");
        assert_eq!(record.status, RecordStatus::Error);
        assert_eq!(record.source_id, "shot_01.png");
        assert!(record.account.is_none());
        assert!(record.proof_id.is_none());
        assert!(record.vote_count.is_none());
        assert!(record.date.is_none());
        assert!(record.error.is_some());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&RecordStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
