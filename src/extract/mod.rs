pub mod normalize;
pub mod rules;
pub mod validate;

use crate::core::model::{ExtractedRecord, RecordStatus};
use rules::{first_match, ACCOUNT_RULES, DATE_RULES, PROOF_ID_RULES, VOTE_COUNT_RULES};

/// Extract fields from one image's normalized text. Fields are matched
/// independently; a miss is a `None`, never a fabricated default. When a
/// narrower-scope `region_text` (cropped sub-region of the same image) is
/// supplied, its matches take precedence for the numeric and date fields.
///
/// The returned status is provisional; `validate::finalize` settles it.
pub fn extract_record(
    source_id: &str,
    text: &str,
    region_text: Option<&str>,
) -> ExtractedRecord {
    let account = first_match(ACCOUNT_RULES, text);
    let proof_id = first_match(PROOF_ID_RULES, text);
    let vote_count = region_text
        .and_then(|region| first_match(VOTE_COUNT_RULES, region))
        .or_else(|| first_match(VOTE_COUNT_RULES, text));
    let date = region_text
        .and_then(|region| first_match(DATE_RULES, region))
        .or_else(|| first_match(DATE_RULES, text));

    ExtractedRecord {
        source_id: source_id.to_string(),
        account,
        proof_id,
        vote_count,
        date,
        status: RecordStatus::Partial,
        error: None,
        raw_text: if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        },
    }
}
