//! Report structures handed to the formatters

use crate::llm::analyzer::Analysis;
use crate::processing::result::{AnalysisOutcome, AnalysisStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static advice shown under a successful analysis.
pub const IMPROVEMENT_TIPS: [&str; 4] = [
    "Add the missing keywords to your resume where applicable",
    "Quantify your achievements with metrics",
    "Tailor your resume summary to better match the job description",
    "Use action verbs and industry-specific terminology",
];

/// Everything a formatter needs to render one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub outcome: AnalysisOutcome,

    /// Improvement tips; empty unless the analysis succeeded and tips are enabled
    pub tips: Vec<String>,

    /// Raw model reply, only kept in debug mode
    pub raw_reply: Option<String>,

    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub resume_file: Option<String>,
    pub job_source: Option<String>,
    pub model: Option<String>,
    pub attempts: u32,
    pub processing_time_ms: u64,
    pub tool_version: String,
}

/// Where the inputs came from, for the report header.
#[derive(Debug, Clone, Default)]
pub struct ReportSources {
    pub resume_file: Option<String>,
    pub job_source: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub include_tips: bool,
    pub debug: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_tips: true,
            debug: false,
        }
    }
}

impl AnalysisReport {
    pub fn from_analysis(analysis: Analysis, sources: ReportSources, options: ReportOptions) -> Self {
        let mut report = Self::from_outcome(analysis.outcome, analysis.raw_reply, sources, options);
        report.metadata.model = Some(analysis.model);
        report.metadata.attempts = analysis.attempts;
        report.metadata.processing_time_ms = analysis.processing_time_ms;
        report
    }

    /// Report for an outcome that did not come from a live model call.
    pub fn from_outcome(
        outcome: AnalysisOutcome,
        raw_reply: Option<String>,
        sources: ReportSources,
        options: ReportOptions,
    ) -> Self {
        let tips = if options.include_tips && outcome.is_success() {
            IMPROVEMENT_TIPS.iter().map(|tip| tip.to_string()).collect()
        } else {
            Vec::new()
        };

        Self {
            outcome,
            tips,
            raw_reply: raw_reply.filter(|_| options.debug),
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                resume_file: sources.resume_file,
                job_source: sources.job_source,
                model: None,
                attempts: 0,
                processing_time_ms: 0,
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        self.outcome.status()
    }

    /// Text for the debug panel, present only in debug mode.
    pub fn debug_reply(&self) -> Option<&str> {
        self.raw_reply.as_deref()
    }
}
