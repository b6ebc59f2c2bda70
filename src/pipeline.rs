use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::core::model::{Batch, ExtractedRecord, RecordStatus};
use crate::export::{CsvExporter, Exporter, JsonExporter};
use crate::extract::normalize::{normalize_fragments, JoinSeparator};
use crate::extract::{extract_record, validate};
use crate::ocr::OcrEngine;
use crate::tally::{aggregate_records, choose_strategy, dedup_records};

/// One uploaded image: its identifier plus the raw bytes.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub source_id: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(source_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_id: source_id.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output: PathBuf,
    pub lang: String,
    pub separator: JoinSeparator,
}

impl PipelineConfig {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            lang: "ja,en".to_string(),
            separator: JoinSeparator::default(),
        }
    }
}

/// Run the full pipeline over a batch of images: OCR each one in upload
/// order, normalize and extract, then deduplicate and aggregate the
/// results.
///
/// Every image yields exactly one diagnostic record. An OCR failure marks
/// that image's record as error and the loop moves on; images are never
/// processed concurrently.
pub fn process_batch(
    engine: &dyn OcrEngine,
    images: &[SourceImage],
    separator: JoinSeparator,
) -> Batch {
    let mut records: Vec<ExtractedRecord> = Vec::with_capacity(images.len());

    for (idx, image) in images.iter().enumerate() {
        info!(
            source_id = %image.source_id,
            "processing image {}/{}",
            idx + 1,
            images.len()
        );
        let record = match engine.recognize(&image.source_id, &image.bytes) {
            Ok(fragments) => {
                let text = normalize_fragments(&fragments, separator);
                validate::finalize(extract_record(&image.source_id, &text, None))
            }
            Err(err) => {
                warn!(source_id = %image.source_id, error = %err, "OCR failed");
                ExtractedRecord::failed(&image.source_id, err.to_string())
            }
        };
        records.push(record);
    }

    // Key strategy looks at the whole batch; dedup and aggregation only
    // consume the OK records.
    let key_strategy = choose_strategy(&records);
    let ok_records: Vec<ExtractedRecord> = records
        .iter()
        .filter(|r| r.status == RecordStatus::Ok)
        .cloned()
        .collect();
    let deduped = dedup_records(&ok_records, key_strategy);
    let (summary, grand_total) = aggregate_records(&deduped);

    Batch {
        records,
        summary,
        grand_total,
        key_strategy,
    }
}

pub fn export_batch(batch: &Batch, output: &Path) -> Result<()> {
    let csv_exporter = CsvExporter::new(output.to_path_buf());
    csv_exporter.export(batch)?;

    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(batch)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::OcrError;
    use crate::core::model::{Fragment, FragmentSet, KeyStrategy};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Engine stand-in that replays canned fragments (or a failure) per
    /// source id.
    struct ScriptedEngine {
        responses: HashMap<String, Vec<String>>,
        failures: Vec<String>,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                failures: Vec::new(),
            }
        }

        fn reads(mut self, source_id: &str, fragments: &[&str]) -> Self {
            self.responses.insert(
                source_id.to_string(),
                fragments.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        fn fails(mut self, source_id: &str) -> Self {
            self.failures.push(source_id.to_string());
            self
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, source_id: &str, _image: &[u8]) -> Result<FragmentSet, OcrError> {
            if self.failures.iter().any(|id| id == source_id) {
                return Err(OcrError::Engine {
                    stderr: "scripted failure".to_string(),
                });
            }
            let texts = self.responses.get(source_id).cloned().unwrap_or_default();
            Ok(texts.into_iter().map(Fragment::text).collect())
        }
    }

    fn image(source_id: &str) -> SourceImage {
        SourceImage::new(source_id, Vec::new())
    }

    #[test]
    fn identical_proofs_collapse_to_one_summary_row() {
        let engine = ScriptedEngine::new()
            .reads("one.png", &["acct:alice@x", "#000123", "5票"])
            .reads("two.png", &["acct:alice@x", "#000123", "5票"]);
        let batch = process_batch(
            &engine,
            &[image("one.png"), image("two.png")],
            JoinSeparator::Space,
        );

        assert_eq!(batch.key_strategy, KeyStrategy::ProofId);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.summary.len(), 1);
        assert_eq!(batch.summary[0].account.as_deref(), Some("alice@x"));
        assert_eq!(batch.summary[0].total_votes, 5);
        assert_eq!(batch.grand_total, 5);
    }

    #[test]
    fn account_based_batch_without_proof_ids() {
        let engine = ScriptedEngine::new()
            .reads("one.png", &["bob", "200"])
            .reads("two.png", &["carol", "3票"]);
        let batch = process_batch(
            &engine,
            &[image("one.png"), image("two.png")],
            JoinSeparator::Space,
        );

        assert_eq!(batch.key_strategy, KeyStrategy::Account);
        assert_eq!(batch.summary.len(), 2);
        assert_eq!(batch.summary[0].account.as_deref(), Some("bob"));
        assert_eq!(batch.summary[0].total_votes, 200);
        assert_eq!(batch.summary[1].account.as_deref(), Some("carol"));
        assert_eq!(batch.summary[1].total_votes, 3);
        assert_eq!(batch.grand_total, 203);
    }

    #[test]
    fn one_failed_image_never_aborts_the_batch() {
        let engine = ScriptedEngine::new()
            .fails("bad.png")
            .reads("good.png", &["alice@x", "5票"]);
        let batch = process_batch(
            &engine,
            &[image("bad.png"), image("good.png")],
            JoinSeparator::Space,
        );

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].status, RecordStatus::Error);
        assert!(batch.records[0].error.is_some());
        assert_eq!(batch.records[1].status, RecordStatus::Ok);
        assert_eq!(batch.grand_total, 5);
    }

    #[test]
    fn diagnostic_rows_always_match_input_count() {
        let engine = ScriptedEngine::new().fails("a.png").fails("b.png");
        let batch = process_batch(
            &engine,
            &[image("a.png"), image("b.png"), image("c.png")],
            JoinSeparator::Newline,
        );
        assert_eq!(batch.records.len(), 3);
        assert!(batch.summary.is_empty());
        assert_eq!(batch.grand_total, 0);
    }

    #[test]
    fn partial_records_are_kept_but_not_aggregated() {
        let engine = ScriptedEngine::new()
            .reads("id-only.png", &["#000123"])
            .reads("full.png", &["alice@x", "5票"]);
        let batch = process_batch(
            &engine,
            &[image("id-only.png"), image("full.png")],
            JoinSeparator::Space,
        );

        assert_eq!(batch.records[0].status, RecordStatus::Partial);
        assert_eq!(batch.records[0].proof_id.as_deref(), Some("000123"));
        // the partial record's proof id still drives the key strategy
        assert_eq!(batch.key_strategy, KeyStrategy::ProofId);
        assert_eq!(batch.summary.len(), 1);
        assert_eq!(batch.grand_total, 5);
    }

    #[test]
    fn grand_total_equals_summary_sum() {
        let engine = ScriptedEngine::new()
            .reads("one.png", &["alice@x", "5票"])
            .reads("two.png", &["bob", "200"])
            .reads("three.png", &["carol", "3票"]);
        let batch = process_batch(
            &engine,
            &[image("one.png"), image("two.png"), image("three.png")],
            JoinSeparator::Space,
        );
        let row_sum: u64 = batch.summary.iter().map(|r| r.total_votes).sum();
        assert_eq!(batch.grand_total, row_sum);
    }

    #[test]
    fn empty_fragment_set_is_a_partial_record_not_an_error() {
        let engine = ScriptedEngine::new().reads("blank.png", &[]);
        let batch = process_batch(&engine, &[image("blank.png")], JoinSeparator::Space);
        assert_eq!(batch.records[0].status, RecordStatus::Partial);
        assert!(batch.records[0].error.is_none());
    }
}
