//! Smart ATS: score a resume against a job description with a hosted Gemini model

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use smart_ats::cli::{self, AnalysisInput, Cli, Commands, ConfigAction};
use smart_ats::config::{Config, OutputFormat};
use smart_ats::error::{Result, SmartAtsError};
use smart_ats::input::InputManager;
use smart_ats::llm::prompts::{PromptParams, PromptTemplate};
use smart_ats::llm::{GeminiClient, GeminiSettings, ResumeAnalyzer, RetryPolicy};
use smart_ats::output::{
    report_target, save_report_to_file, truncate_text, AnalysisReport, ReportGenerator,
    ReportOptions, ReportSources,
};
use smart_ats::processing::normalize_reply;
use std::path::Path;
use std::process;
use std::time::Duration;

/// Exit code when the analysis ran but produced no usable result.
const EXIT_ANALYSIS_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    // A local .env may carry the API key
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if !config.output.color_output {
        colored::control::set_override(false);
    }

    match run_command(cli.command, config, &config_path).await {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_ANALYSIS_FAILED),
        Err(e) => {
            error!("Command failed: {}", e);
            process::exit(1);
        }
    }
}

/// Returns whether the command ended in a usable result.
async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<bool> {
    match command {
        Commands::Analyze {
            input,
            model,
            output,
            save,
            debug,
            no_tips,
        } => {
            // No credential, no work
            let mut settings = GeminiSettings::from_env(&config.model)?;
            if let Some(model) = model {
                settings = settings.with_model(model);
            }

            let output_format = resolve_output_format(output.as_deref(), &config)?;
            let input_manager = InputManager::new();
            let (resume_text, job_text) = read_inputs(&input_manager, &input).await?;

            info!(
                "Analyzing {} ({} chars) with {}",
                input.resume.display(),
                resume_text.len(),
                settings.model
            );

            let analyzer = ResumeAnalyzer::new(GeminiClient::new(settings)?, RetryPolicy::from(&config.retry));

            let spinner = (output_format == OutputFormat::Console).then(waiting_spinner);
            let analysis = analyzer.analyze(&resume_text, &job_text).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            let analysis = analysis?;

            let options = ReportOptions {
                include_tips: config.output.show_tips && !no_tips,
                debug: debug || config.output.debug,
            };
            let report = AnalysisReport::from_analysis(analysis, report_sources(&input), options);
            let succeeded = report.outcome.is_success();

            let generator = ReportGenerator::new(config.output.color_output);
            let rendered = generator.generate_report(&report, &output_format)?;
            println!("{}", rendered);

            if let Some(save_path) = save {
                let target = report_target(&save_path, &output_format, &input.resume);
                // Saved console reports are plain text
                let content = if output_format == OutputFormat::Console {
                    ReportGenerator::new(false)
                        .generate_report(&report, &output_format)?
                } else {
                    rendered
                };
                save_report_to_file(&content, &target)?;
                println!("💾 Report saved to {}", target.display());
            }

            Ok(succeeded)
        }

        Commands::Prompt { input } => {
            let input_manager = InputManager::new();
            let (resume_text, job_text) = read_inputs(&input_manager, &input).await?;

            let prompt = PromptTemplate::default().render(&PromptParams {
                resume_content: resume_text,
                job_content: job_text,
            });
            println!("{}", prompt);
            Ok(true)
        }

        Commands::Normalize { reply, output, debug } => {
            let output_format = resolve_output_format(output.as_deref(), &config)?;
            let raw = InputManager::new().read_reply(&reply, std::io::stdin().lock())?;

            let outcome = normalize_reply(&raw);
            info!("Normalized reply: {}", outcome.status());

            let succeeded = outcome.is_success();
            let options = ReportOptions {
                include_tips: config.output.show_tips,
                debug: debug || config.output.debug,
            };
            let report = AnalysisReport::from_outcome(outcome, Some(raw), ReportSources::default(), options);

            let generator = ReportGenerator::new(config.output.color_output);
            println!("{}", generator.generate_report(&report, &output_format)?);
            Ok(succeeded)
        }

        Commands::Config { action } => {
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration\n");
                    println!("Model: {}", config.model.name);
                    println!("Endpoint: {}", config.model.endpoint);
                    println!("API key variable: {}", config.model.api_key_env);
                    println!("Request timeout: {}s", config.model.timeout_secs);
                    println!("\nRetry:");
                    println!("  Attempts: {}", config.retry.attempts());
                    println!("  Delay: {}ms", config.retry.delay_ms);
                    println!("\nOutput:");
                    println!("  Format: {:?}", config.output.format);
                    println!("  Colors: {}", config.output.color_output);
                    println!("  Tips: {}", config.output.show_tips);
                    println!("  Debug: {}", config.output.debug);
                }

                Some(ConfigAction::Path) => {
                    println!("{}", config_path.display());
                }

                Some(ConfigAction::Reset) => {
                    println!("🔄 Resetting configuration to defaults...");
                    Config::default().save_to(config_path)?;
                    println!("✅ Configuration reset successfully!");
                }

                Some(ConfigAction::Set { key, value }) => {
                    let mut config = config;
                    config.set_value(&key, &value)?;
                    config.save_to(config_path)?;
                    println!("✅ {} = {}", key, value);
                }
            }
            Ok(true)
        }
    }
}

fn resolve_output_format(flag: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match flag {
        Some(format) => cli::parse_output_format(format).map_err(SmartAtsError::InvalidInput),
        None => Ok(config.output.format),
    }
}

/// Resume text and job description text for one request.
async fn read_inputs(input_manager: &InputManager, input: &AnalysisInput) -> Result<(String, String)> {
    cli::validate_file_extension(&input.resume, &["pdf", "txt", "text", "md", "markdown"])
        .map_err(|e| SmartAtsError::InvalidInput(format!("Resume file: {}", e)))?;

    let resume_text = input_manager.extract_resume(&input.resume).await?;

    let job_text = match (&input.job, &input.jd) {
        (Some(job), _) => {
            cli::validate_file_extension(job, &["txt", "text", "md", "markdown"])
                .map_err(|e| SmartAtsError::InvalidInput(format!("Job description file: {}", e)))?;
            input_manager.extract_text(job).await?
        }
        (None, Some(jd)) => jd.clone(),
        (None, None) => {
            return Err(SmartAtsError::InvalidInput(
                "a job description is required (--job or --jd)".to_string(),
            ));
        }
    };

    debug!("Resume preview: {}", truncate_text(&resume_text, 300));
    debug!("Job description preview: {}", truncate_text(&job_text, 300));

    Ok((resume_text, job_text))
}

fn report_sources(input: &AnalysisInput) -> ReportSources {
    ReportSources {
        resume_file: Some(input.resume.display().to_string()),
        job_source: Some(match &input.job {
            Some(job) => job.display().to_string(),
            None => "inline".to_string(),
        }),
    }
}

fn waiting_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message("Waiting for the model...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
