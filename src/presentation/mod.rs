//! Prediction page and charts

pub mod charts;
pub mod page;

pub use page::{render_page, PageState};
