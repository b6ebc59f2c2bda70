pub mod csv_export;
pub mod json_export;

use anyhow::Result;

use crate::core::model::Batch;

pub use csv_export::CsvExporter;
pub use json_export::JsonExporter;

pub trait Exporter {
    fn export(&self, batch: &Batch) -> Result<()>;
}
