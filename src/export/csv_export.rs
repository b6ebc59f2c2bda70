use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::model::Batch;
use crate::export::Exporter;

/// UTF-8 byte-order-mark so spreadsheet tools pick the right encoding for
/// the Japanese text in account and raw fields.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Writes the diagnostic table (`records.csv`, one row per input image)
/// and the summary table (`summary.csv`, one row per account).
#[derive(Debug, Clone)]
pub struct CsvExporter {
    out_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn writer(path: &Path) -> Result<csv::Writer<File>> {
        let mut file = File::create(path)?;
        file.write_all(UTF8_BOM)?;
        Ok(csv::Writer::from_writer(file))
    }

    fn write_records(&self, batch: &Batch) -> Result<()> {
        let mut wtr = Self::writer(&self.out_dir.join("records.csv"))?;
        wtr.write_record(["source_id", "account", "proof_id", "vote_count", "date", "status"])?;
        for record in &batch.records {
            let vote_count = record.vote_count.map(|v| v.to_string());
            wtr.write_record([
                record.source_id.as_str(),
                record.account.as_deref().unwrap_or(""),
                record.proof_id.as_deref().unwrap_or(""),
                vote_count.as_deref().unwrap_or(""),
                record.date.as_deref().unwrap_or(""),
                record.status.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_summary(&self, batch: &Batch) -> Result<()> {
        let mut wtr = Self::writer(&self.out_dir.join("summary.csv"))?;
        wtr.write_record(["account", "total_votes"])?;
        for row in &batch.summary {
            let total = row.total_votes.to_string();
            wtr.write_record([row.account.as_deref().unwrap_or(""), total.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn export(&self, batch: &Batch) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        self.write_records(batch)?;
        self.write_summary(batch)?;
        Ok(())
    }
}
