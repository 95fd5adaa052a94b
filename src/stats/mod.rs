// Statistics module - box office parsing, title normalization and aggregation

pub mod aggregate;
pub mod box_office;
pub mod format;
pub mod title;
