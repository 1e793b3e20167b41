//! Output formatters: console, JSON, Markdown and HTML

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::AnalysisReport;
use crate::processing::result::{AnalysisOutcome, AnalysisResult};
use askama::Template;
use colored::{Color, Colorize};
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
}

/// Console formatter with colors and keyword chips
pub struct ConsoleFormatter {
    use_colors: bool,
}

/// Pretty-printed JSON for scripting
pub struct JsonFormatter;

pub struct MarkdownFormatter;

/// HTML formatter, rendered through an askama template
pub struct HtmlFormatter;

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Smart ATS Resume Analysis</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #2c3e50;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .main-title {
            text-align: center;
            color: #2c3e50;
            padding: 20px;
        }
        .result-card {
            padding: 20px;
            border-radius: 10px;
            margin: 10px 0;
            background-color: #f8f9fa;
            border: 1px solid #dee2e6;
        }
        .match {
            text-align: center;
        }
        .match-percentage {
            font-size: 24px;
            font-weight: bold;
        }
        .score-good { color: #28a745; }
        .score-fair { color: #d39e00; }
        .score-poor { color: #dc3545; }
        .keywords-section {
            margin: 20px 0;
        }
        .keyword-pill {
            display: inline-block;
            padding: 5px 10px;
            margin: 5px;
            background-color: #e9ecef;
            border-radius: 15px;
            font-size: 14px;
        }
        .summary {
            padding: 20px;
            background-color: white;
            border-radius: 5px;
            border: 1px solid #dee2e6;
        }
        .tips {
            background: #e8f4fd;
            padding: 15px 15px 15px 35px;
            border-radius: 6px;
        }
        .error {
            background: #f8d7da;
            color: #721c24;
            padding: 15px;
            border-radius: 6px;
            border: 1px solid #f5c6cb;
        }
        pre.raw-reply {
            background: #272822;
            color: #f8f8f2;
            padding: 15px;
            border-radius: 6px;
            overflow-x: auto;
            white-space: pre-wrap;
        }
        .metadata {
            background: #e9ecef;
            padding: 15px;
            border-radius: 6px;
            margin-top: 30px;
            font-size: 0.9em;
            color: #6c757d;
        }
    </style>
</head>
<body>
    <h1 class="main-title">Smart ATS Resume Analyzer</h1>

    {% if has_error %}
    <div class="error"><strong>Analysis failed.</strong> {{ error_message }}</div>
    {% endif %}

    {% if has_result %}
    <div class="result-card">
        <h2 class="match">JD Match: <span class="match-percentage {{ score_class }}">{{ match_percentage }}</span></h2>

        <h3>🎯 Missing Keywords</h3>
        <div class="keywords-section">
            {% for keyword in missing_keywords %}<span class="keyword-pill">{{ keyword }}</span>{% endfor %}
            {% if !has_keywords %}<p>No missing keywords.</p>{% endif %}
        </div>

        <h3>📋 Profile Summary</h3>
        <div class="summary">{{ profile_summary }}</div>
    </div>
    {% endif %}

    {% if has_tips %}
    <h3>💡 Next Steps</h3>
    <ol class="tips">
        {% for tip in tips %}<li>{{ tip }}</li>{% endfor %}
    </ol>
    {% endif %}

    {% if has_raw_reply %}
    <h3>Raw Model Reply</h3>
    <pre class="raw-reply">{{ raw_reply }}</pre>
    {% endif %}

    <div class="metadata">
        <p><strong>Generated:</strong> {{ generated_at }} | <strong>Model:</strong> {{ model }} | <strong>Status:</strong> {{ status }}</p>
        <p><strong>Resume:</strong> {{ resume_file }} | <strong>Job:</strong> {{ job_source }}</p>
        <p>Smart ATS v{{ version }}</p>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    has_error: bool,
    error_message: String,
    has_result: bool,
    match_percentage: String,
    score_class: String,
    missing_keywords: Vec<String>,
    has_keywords: bool,
    profile_summary: String,
    has_tips: bool,
    tips: Vec<String>,
    has_raw_reply: bool,
    raw_reply: String,
    generated_at: String,
    model: String,
    status: String,
    resume_file: String,
    job_source: String,
    version: String,
}

/// Display form of the match percentage, `n/a` when the reply had none.
fn match_label(result: &AnalysisResult) -> String {
    result
        .match_percentage
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn generated_at(report: &AnalysisReport) -> String {
    report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn file_label(path: &Option<String>) -> String {
    match path {
        Some(path) => Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone()),
        None => "-".to_string(),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            85..=100 => ("EXCELLENT", Color::Green),
            70..=84 => ("GOOD", Color::BrightGreen),
            50..=69 => ("FAIR", Color::Yellow),
            _ => ("LOW", Color::Red),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_result(&self, output: &mut String, result: &AnalysisResult) {
        output.push_str(&self.format_header("JD Match", 2));
        let label = match_label(result);
        match result.match_percentage.as_ref().and_then(|p| p.rounded()) {
            Some(score) => output.push_str(&format!(
                "{} {}\n",
                self.colorize(&label, Color::Cyan),
                self.format_score_badge(score)
            )),
            None => output.push_str(&format!("{}\n", self.colorize(&label, Color::Cyan))),
        }

        output.push_str(&self.format_header("🎯 Missing Keywords", 2));
        if result.missing_keywords.is_empty() {
            output.push_str(&format!("{}\n", self.colorize("No missing keywords.", Color::Green)));
        } else {
            let chips: Vec<String> = result
                .missing_keywords
                .iter()
                .map(|keyword| self.colorize(&format!("[{}]", keyword), Color::Yellow))
                .collect();
            output.push_str(&format!("  {}\n", chips.join("  ")));
        }

        output.push_str(&self.format_header("📋 Profile Summary", 2));
        if result.profile_summary.trim().is_empty() {
            output.push_str(&format!("{}\n", self.colorize("(none)", Color::BrightBlack)));
        } else {
            output.push_str(&format!("{}\n", result.profile_summary));
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 SMART ATS RESUME ANALYSIS", 1));
        output.push_str(&format!("Generated: {}", generated_at(report)));
        if let Some(model) = &report.metadata.model {
            output.push_str(&format!(
                " | Model: {} | {} attempt(s) in {}ms",
                model, report.metadata.attempts, report.metadata.processing_time_ms
            ));
        }
        output.push('\n');

        match &report.outcome {
            AnalysisOutcome::Success(result) => self.format_result(&mut output, result),
            AnalysisOutcome::ParseFailure { partial, .. } => {
                output.push_str(&self.format_header("❌ Analysis Failed", 2));
                if let Some(message) = report.outcome.error_message() {
                    output.push_str(&format!("{}\n", self.colorize(&message, Color::Red)));
                }
                if let Some(partial) = partial {
                    output.push_str(&self.colorize("\nPartial result:\n", Color::BrightBlack));
                    self.format_result(&mut output, partial);
                }
                if report.debug_reply().is_none() {
                    output.push_str(&self.colorize("\nRun with --debug to see the raw model reply.\n", Color::BrightBlack));
                }
            }
            AnalysisOutcome::TransportFailure { .. } => {
                output.push_str(&self.format_header("❌ Analysis Failed", 2));
                if let Some(message) = report.outcome.error_message() {
                    output.push_str(&format!("{}\n", self.colorize(&message, Color::Red)));
                }
            }
        }

        if !report.tips.is_empty() {
            output.push_str(&self.format_header("💡 Next Steps", 2));
            for (i, tip) in report.tips.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, tip));
            }
        }

        if let Some(raw) = report.debug_reply() {
            output.push_str(&self.format_header("Raw Model Reply", 3));
            output.push_str(raw);
            output.push('\n');
        }

        Ok(output)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

impl MarkdownFormatter {
    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            85..=100 => "🟢 Excellent",
            70..=84 => "🟡 Good",
            50..=69 => "🟠 Fair",
            _ => "🔴 Low",
        }
    }

    fn format_result(output: &mut String, result: &AnalysisResult) {
        let label = match_label(result);
        match result.match_percentage.as_ref().and_then(|p| p.rounded()) {
            Some(score) => output.push_str(&format!(
                "## JD Match: {} {}\n\n",
                label,
                Self::markdown_score_badge(score)
            )),
            None => output.push_str(&format!("## JD Match: {}\n\n", label)),
        }

        output.push_str("## 🎯 Missing Keywords\n\n");
        if result.missing_keywords.is_empty() {
            output.push_str("No missing keywords.\n\n");
        } else {
            let chips: Vec<String> = result
                .missing_keywords
                .iter()
                .map(|keyword| format!("`{}`", keyword))
                .collect();
            output.push_str(&format!("{}\n\n", chips.join(" ")));
        }

        output.push_str("## 📋 Profile Summary\n\n");
        if result.profile_summary.trim().is_empty() {
            output.push_str("_No summary provided._\n\n");
        } else {
            output.push_str(&format!("{}\n\n", result.profile_summary.trim()));
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 Smart ATS Resume Analysis\n\n");

        output.push_str(&format!(
            "**Generated:** {} | **Model:** {} | **Status:** {}\n",
            generated_at(report),
            report.metadata.model.as_deref().unwrap_or("-"),
            report.status()
        ));
        output.push_str(&format!(
            "**Resume:** `{}` | **Job:** `{}`\n\n",
            file_label(&report.metadata.resume_file),
            file_label(&report.metadata.job_source)
        ));

        if let Some(message) = report.outcome.error_message() {
            output.push_str("## ❌ Analysis Failed\n\n");
            output.push_str(&format!("> {}\n\n", message));
        }

        if let Some(result) = report.outcome.result() {
            Self::format_result(&mut output, result);
        }

        if !report.tips.is_empty() {
            output.push_str("## 💡 Next Steps\n\n");
            for (i, tip) in report.tips.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, tip));
            }
            output.push('\n');
        }

        if let Some(raw) = report.debug_reply() {
            output.push_str("## Raw Model Reply\n\n");
            output.push_str(&format!("~~~~\n{}\n~~~~\n", raw));
        }

        Ok(output)
    }
}

impl HtmlFormatter {
    fn create_template_data(&self, report: &AnalysisReport) -> HtmlTemplate {
        let result = report.outcome.result();

        let score_class = match result
            .and_then(|r| r.match_percentage.as_ref())
            .and_then(|p| p.rounded())
        {
            Some(70..=100) => "score-good",
            Some(50..=69) => "score-fair",
            Some(_) => "score-poor",
            None => "",
        };

        let missing_keywords = result.map(|r| r.missing_keywords.clone()).unwrap_or_default();
        let error_message = report.outcome.error_message();
        let raw_reply = report.debug_reply();

        HtmlTemplate {
            has_error: error_message.is_some(),
            error_message: error_message.unwrap_or_default(),
            has_result: result.is_some(),
            match_percentage: result.map(match_label).unwrap_or_default(),
            score_class: score_class.to_string(),
            has_keywords: !missing_keywords.is_empty(),
            missing_keywords,
            profile_summary: result.map(|r| r.profile_summary.clone()).unwrap_or_default(),
            has_tips: !report.tips.is_empty(),
            tips: report.tips.clone(),
            has_raw_reply: raw_reply.is_some(),
            raw_reply: raw_reply.unwrap_or_default().to_string(),
            generated_at: generated_at(report),
            model: report.metadata.model.clone().unwrap_or_else(|| "-".to_string()),
            status: report.status().to_string(),
            resume_file: file_label(&report.metadata.resume_file),
            job_source: file_label(&report.metadata.job_source),
            version: report.metadata.tool_version.clone(),
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let template_data = self.create_template_data(report);
        Ok(template_data.render()?)
    }
}

impl ReportGenerator {
    /// `use_colors` only affects the console format.
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter,
            markdown_formatter: MarkdownFormatter,
            html_formatter: HtmlFormatter,
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
        }
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_ats{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_ats{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_ats{}.md", base_name, timestamp_suffix),
        OutputFormat::Html => format!("{}_ats{}.html", base_name, timestamp_suffix),
    }
}

/// Where `--save` writes: a directory gets a generated file name inside it,
/// anything else is used as given.
pub fn report_target(save_path: &Path, format: &OutputFormat, resume: &Path) -> PathBuf {
    if save_path.is_dir() {
        save_path.join(suggest_filename(format, &resume.to_string_lossy(), true))
    } else {
        save_path.to_path_buf()
    }
}

/// Cut text to at most `max_graphemes` user-visible characters, ending on a
/// word boundary where one is available.
pub fn truncate_text(text: &str, max_graphemes: usize) -> String {
    let graphemes: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
    if graphemes.len() <= max_graphemes {
        return text.to_string();
    }

    let cut = graphemes[max_graphemes].0;
    let truncated = &text[..cut];
    let end = truncated.rfind(char::is_whitespace).filter(|&i| i > 0).unwrap_or(cut);
    format!("{}...", truncated[..end].trim_end())
}
