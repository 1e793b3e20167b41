//! Hosted model integration

pub mod analyzer;
pub mod client;
pub mod prompts;

pub use analyzer::{Analysis, ResumeAnalyzer, RetryPolicy};
pub use client::{GeminiClient, GeminiSettings, GenerationError, TextGenerator};
