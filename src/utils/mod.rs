//! Utility functions and data structures.
//!
//! - [`app_data`] - Configuration file and application data directory (XDG-compliant)

pub mod app_data;

pub use app_data::*;
