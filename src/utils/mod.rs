//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Configuration for the preview cursor and completion

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{AssistConfig, CompletionConfig, PreviewConfig, AUTO_COLOR};
pub use error::{AssistError, AssistResult};
