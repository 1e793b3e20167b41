//! Reply processing module
//! Normalizes raw model replies into structured analysis results

pub mod normalizer;
pub mod result;

pub use normalizer::{normalize_reply, strip_code_fence};
pub use result::{AnalysisOutcome, AnalysisResult, AnalysisStatus, MatchPercentage};
