//! Downloadable reports of a single prediction

pub mod document;
pub mod record;
pub mod tabular;

pub use document::{export_pdf, layout_document, DocumentLayout};
pub use record::ResultRecord;
pub use tabular::export_csv;
