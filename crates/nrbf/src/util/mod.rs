//! Utility functions for NRBF.

pub mod datetime;

pub use datetime::{format_duration, format_ticks, parse_ticks, DateTimeParseError};
