//! Editor assistance engines

pub mod completion;
pub mod preview;
