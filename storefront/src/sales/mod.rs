//! Sales bookkeeping helpers

pub mod import;

pub use import::{SkippedRow, parse_orders_csv};
