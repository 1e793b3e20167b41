//! CLI interface for smart-ats

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "smart-ats")]
#[command(about = "Score a resume against a job description with a hosted Gemini model")]
#[command(long_about = "Act like an applicant tracking system: report the JD match percentage, the keywords missing from the resume and a short profile summary")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a resume against a job description
    Analyze {
        #[command(flatten)]
        input: AnalysisInput,

        /// Gemini model to use (overrides the configuration)
        #[arg(short, long)]
        model: Option<String>,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save the rendered report to a file or directory
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show the raw model reply next to the parsed result
        #[arg(short, long)]
        debug: bool,

        /// Leave out the static improvement tips
        #[arg(long)]
        no_tips: bool,
    },

    /// Print the prompt that would be sent to the model
    Prompt {
        #[command(flatten)]
        input: AnalysisInput,
    },

    /// Normalize a saved model reply ("-" reads stdin)
    Normalize {
        reply: PathBuf,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Show the raw model reply next to the parsed result
        #[arg(short, long)]
        debug: bool,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
pub struct AnalysisInput {
    /// Path to resume file (PDF, TXT, MD)
    #[arg(short, long)]
    pub resume: PathBuf,

    /// Path to job description file (TXT, MD)
    #[arg(short, long, conflicts_with = "jd", required_unless_present = "jd")]
    pub job: Option<PathBuf>,

    /// Job description text given inline
    #[arg(long)]
    pub jd: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retry.max_attempts")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        "html" => Ok(crate::config::OutputFormat::Html),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(parse_output_format("md").unwrap(), OutputFormat::Markdown);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("cv.PDF"), &["pdf", "txt"]).is_ok());
        assert!(validate_file_extension(Path::new("cv.docx"), &["pdf", "txt"]).is_err());
        assert!(validate_file_extension(Path::new("cv"), &["pdf"]).is_err());
    }

    #[test]
    fn test_job_source_is_required() {
        let parsed = Cli::try_parse_from(["smart-ats", "analyze", "--resume", "cv.pdf"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "smart-ats", "analyze", "--resume", "cv.pdf", "--job", "jd.txt", "--jd", "text",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "smart-ats", "analyze", "--resume", "cv.pdf", "--jd", "Rust developer", "--debug",
        ])
        .unwrap();
        match parsed.command {
            Commands::Analyze { input, debug, .. } => {
                assert_eq!(input.jd.as_deref(), Some("Rust developer"));
                assert!(debug);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_normalize_debug_flag() {
        let parsed = Cli::try_parse_from(["smart-ats", "normalize", "-", "-d", "-o", "json"]).unwrap();
        match parsed.command {
            Commands::Normalize { reply, output, debug } => {
                assert_eq!(reply, PathBuf::from("-"));
                assert_eq!(output.as_deref(), Some("json"));
                assert!(debug);
            }
            _ => panic!("expected normalize command"),
        }

        let parsed = Cli::try_parse_from(["smart-ats", "normalize", "reply.txt"]).unwrap();
        assert!(matches!(parsed.command, Commands::Normalize { debug: false, .. }));
    }
}
