//! User interface components for terminal output.
//!
//! - [`display`]: report and recipe tables, status lines
//! - [`progress`]: progress bar for batch processing

pub mod display;
pub mod progress;
