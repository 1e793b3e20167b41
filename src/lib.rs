//! Smart ATS library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod llm;
pub mod output;

pub use error::{Result, SmartAtsError};
pub use config::Config;
pub use processing::{normalize_reply, AnalysisOutcome, AnalysisResult};
