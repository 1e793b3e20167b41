//! Output module
//! Builds analysis reports and renders them for the terminal or for files

pub mod formatter;
pub mod report;

pub use formatter::{
    report_target, save_report_to_file, suggest_filename, truncate_text, OutputFormatter, ReportGenerator,
};
pub use report::{AnalysisReport, ReportMetadata, ReportOptions, ReportSources};
