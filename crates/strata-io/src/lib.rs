//! File I/O, validation, and table types for the strata pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Column, ColumnValues, Dataset};
pub use error::IoError;
pub use reader::TableReader;
pub use writer::TableWriter;
