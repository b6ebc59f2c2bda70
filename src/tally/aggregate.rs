use std::collections::HashMap;

use crate::core::model::{ExtractedRecord, SummaryRow};

/// Sum vote counts per account over the deduplicated set. Rows come out in
/// first-seen account order; a null account is a real group of its own. A
/// null vote count sums as zero. Returns the rows plus the grand total.
pub fn aggregate_records(records: &[ExtractedRecord]) -> (Vec<SummaryRow>, u64) {
    let mut rows: Vec<SummaryRow> = Vec::new();
    let mut index: HashMap<Option<String>, usize> = HashMap::new();

    for record in records {
        let votes = record.vote_count.unwrap_or(0);
        match index.get(&record.account) {
            Some(&i) => rows[i].total_votes += votes,
            None => {
                index.insert(record.account.clone(), rows.len());
                rows.push(SummaryRow {
                    account: record.account.clone(),
                    total_votes: votes,
                });
            }
        }
    }

    let grand_total = rows.iter().map(|row| row.total_votes).sum();
    (rows, grand_total)
}
