pub mod core;
pub mod export;
pub mod extract;
pub mod ocr;
pub mod pipeline;
pub mod tally;

pub use crate::core::model::{Batch, ExtractedRecord, RecordStatus, SummaryRow};
