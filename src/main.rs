// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use glossa::app_config::{self, Config};
use glossa::errors::AppError;
use glossa::glossary::{GlossaryConstraint, GlossaryEntry, GlossaryRetriever};
use glossa::language_utils::normalize_to_part1_or_part2t;
use glossa::protection::{ProtectionOptions, RestoreMode, SpanProtector};
use glossa::providers::ollama::Ollama;
use glossa::providers::{CredentialSource, ModelRouter};
use glossa::translation::{PipelineOptions, TranslationPipeline, TranslationRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate text with glossary constraints
    Translate(TranslateArgs),

    /// Show the protected form of a text and its restoration map as JSON
    Protect(ProtectArgs),

    /// List the model routing table
    Models {
        /// Also contact every provider that has a credential
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completions for glossa
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Switches for the optional protection passes
#[derive(Args, Debug, Clone, Copy)]
struct ProtectionArgs {
    /// Leave currency, percent, date and time tokens unprotected
    #[arg(long)]
    no_numbers: bool,

    /// Also protect every remaining standalone number
    #[arg(long)]
    plain_numbers: bool,
}

impl ProtectionArgs {
    fn apply(&self, mut options: ProtectionOptions) -> ProtectionOptions {
        if self.no_numbers {
            options.numeric = false;
        }
        if self.plain_numbers {
            options.plain_numbers = true;
        }
        options
    }
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Text to translate (use --input for a file)
    #[arg(value_name = "TEXT", conflicts_with = "input")]
    text: Option<String>,

    /// File with one string per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write translations here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with a list of {term_src, target, definition, notes}
    #[arg(long, conflicts_with = "glossary")]
    constraints: Option<PathBuf>,

    /// JSON glossary rows; the best matches per line become constraints
    #[arg(long)]
    glossary: Option<PathBuf>,

    /// Logical model name from the routing table
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code or name
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name
    #[arg(short, long)]
    target_language: Option<String>,

    #[command(flatten)]
    protection: ProtectionArgs,

    /// Fail when the translation lost, duplicated or invented markers
    #[arg(long)]
    strict: bool,

    /// Run the quality-control review pass
    #[arg(long)]
    review: bool,

    /// Print one JSON object per line with fidelity and adherence
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ProtectArgs {
    /// Text to protect (use --input for a file)
    #[arg(value_name = "TEXT", conflicts_with = "input")]
    text: Option<String>,

    /// File whose whole content is protected
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[command(flatten)]
    protection: ProtectionArgs,
}

/// glossa - glossary-constrained machine translation
///
/// Protects markup, placeholders and numbers, asks a chat model for a
/// translation that follows the glossary, and restores the protected spans.
#[derive(Parser, Debug)]
#[command(name = "glossa")]
#[command(version)]
#[command(about = "Glossary-constrained translation with span protection")]
#[command(long_about = "glossa protects markup, placeholders and numeric tokens, translates with a routed chat model under glossary constraints, and restores the protected spans.

EXAMPLES:
    glossa translate -t fr 'Click <b>here</b> for {{name}}'
    glossa translate -t ja --constraints terms.json -i strings.txt -o out.txt
    glossa translate -m llama3-70b --strict --review 'Pay $15.99 now'
    glossa protect --plain-numbers '<font size=\"12\">Save 20%</font> on 3 items'
    glossa models --check
    glossa completions bash > glossa.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one will be created automatically. API keys are read from the
    environment variables named in the provider table (OPENAI_API_KEY,
    GROQ_API_KEY).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    fn emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                Self::emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger accepts everything; the effective level is set with set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = cli.log_level {
        log::set_max_level(level_filter(level.into()));
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "glossa", &mut std::io::stdout());
            Ok(())
        }
        Commands::Protect(args) => run_protect(args),
        Commands::Models { check } => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_models(&config, check).await;
            Ok(())
        }
        Commands::Translate(args) => {
            let mut config = load_config(&cli.config_path, cli.log_level)?;
            apply_overrides(&mut config, &args);
            config
                .validate()
                .map_err(|e| AppError::Config(format!("{:#}", e)))?;
            run_translate(config, args).await
        }
    }
}

/// Load or create the configuration and apply its log level unless the CLI set one
fn load_config(path: &Path, cli_level: Option<CliLogLevel>) -> Result<Config> {
    if !path.exists() {
        warn!("Config file not found at '{}', creating default config.", path.display());
    }
    let config = Config::load_or_create(path)?;
    if cli_level.is_none() {
        log::set_max_level(level_filter(config.log_level));
    }
    Ok(config)
}

/// Override config with CLI options if provided
fn apply_overrides(config: &mut Config, args: &TranslateArgs) {
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(source) = &args.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &args.target_language {
        config.target_language = target.clone();
    }
    config.protection.options = args.protection.apply(config.protection.options);
    if args.strict {
        config.protection.strict_restore = true;
    }
    if args.review {
        config.generation.review = true;
    }
}

fn read_text(text: Option<String>, input: Option<&Path>) -> Result<String> {
    match (text, input) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
            anyhow::Error::from(AppError::File(format!(
                "Failed to read input file {}: {}",
                path.display(),
                e
            )))
        }),
        (None, None) => Err(anyhow!("Provide a TEXT argument or --input")),
    }
}

fn run_protect(args: ProtectArgs) -> Result<()> {
    let text = read_text(args.text, args.input.as_deref())?;
    let protector = SpanProtector::with_options(args.protection.apply(ProtectionOptions::default()));
    let protected = protector.protect(&text);
    let json = serde_json::to_string_pretty(&protected).context("Failed to serialize protected text")?;
    println!("{}", json);
    Ok(())
}

async fn run_models(config: &Config, check: bool) {
    let credentials = CredentialSource::Environment;
    let router = ModelRouter::from_config(config);
    let mut checked: HashMap<String, String> = HashMap::new();

    for route in &config.models {
        let mut status = match config.provider(&route.provider) {
            Some(provider) => match &provider.env {
                Some(var) if credentials.lookup(var).is_some() => "ready".to_string(),
                Some(var) => format!("missing {}", var),
                None => "no key needed".to_string(),
            },
            None => "unknown provider".to_string(),
        };

        if check && (status == "ready" || status == "no key needed") {
            if !checked.contains_key(&route.provider) {
                let result = match router.check_connection(&route.name).await {
                    Ok(()) => "reachable".to_string(),
                    Err(e) => {
                        warn!("Connection check for '{}' failed: {}", route.provider, e);
                        "unreachable".to_string()
                    }
                };
                checked.insert(route.provider.clone(), result);
            }
            if let Some(result) = checked.get(&route.provider) {
                status = format!("{}, {}", status, result);
            }
        }

        let marker = if route.name == config.model { "*" } else { " " };
        println!(
            "{} {:<16} {:<10} {:<28} {}",
            marker, route.name, route.provider, route.remote_id, status
        );
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} file: {}", what, path.display()))
}

async fn build_requests(config: &Config, args: &TranslateArgs, lines: Vec<String>) -> Result<Vec<TranslationRequest>> {
    if let Some(path) = &args.glossary {
        let entries: Vec<GlossaryEntry> = load_json(path, "glossary")?;
        let column = normalize_to_part1_or_part2t(&config.target_language)?;
        let embedder = Ollama::from_url(config.retrieval.endpoint.clone())
            .with_embedding_model(config.retrieval.embedding_model.clone());
        let retriever = GlossaryRetriever::new(embedder, entries, column).with_top_k(config.retrieval.top_k);

        let mut requests = Vec::with_capacity(lines.len());
        for line in lines {
            if line.trim().is_empty() {
                requests.push(TranslationRequest::new(line, Vec::new()));
                continue;
            }
            let constraints = retriever.retrieve(&line).await?;
            debug!("{} constraints retrieved for '{}'", constraints.len(), line);
            requests.push(TranslationRequest::new(line, constraints));
        }
        return Ok(requests);
    }

    let constraints: Vec<GlossaryConstraint> = match &args.constraints {
        Some(path) => load_json(path, "constraints")?,
        None => Vec::new(),
    };
    Ok(lines
        .into_iter()
        .map(|line| TranslationRequest::new(line, constraints.clone()))
        .collect())
}

async fn run_translate(config: Config, args: TranslateArgs) -> Result<()> {
    let text = read_text(args.text.clone(), args.input.as_deref())?;
    let lines: Vec<String> = if args.input.is_some() {
        text.lines().map(str::to_string).collect()
    } else {
        vec![text]
    };

    let requests = build_requests(&config, &args, lines).await?;
    let options = PipelineOptions::from_config(&config)?;
    info!(
        "Translating {} string(s) to {} with '{}' ({} restore)",
        requests.len(),
        options.target_language,
        options.model,
        if options.restore_mode == RestoreMode::Strict { "strict" } else { "best-effort" }
    );

    let pipeline = TranslationPipeline::new(ModelRouter::from_config(&config), options);

    let progress_bar = if requests.len() > 1 {
        let pb = ProgressBar::new(requests.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let results = pipeline
        .translate_batch_with_progress(&requests, |done, _| {
            if let Some(pb) = &progress_bar {
                pb.set_position(done as u64);
            }
        })
        .await;
    if let Some(pb) = &progress_bar {
        pb.finish_with_message("done");
    }

    let mut output = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(outcome) if args.json => output.push(
                serde_json::to_string(&outcome).context("Failed to serialize translation outcome")?,
            ),
            Ok(outcome) => output.push(outcome.translation),
            Err(e) => {
                failures += 1;
                warn!("Failed to translate '{}': {}", request.source, AppError::from(e));
                output.push(String::new());
            }
        }
    }

    let rendered = output.join("\n");
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Wrote {} line(s) to {}", output.len(), path.display());
        }
        None => println!("{}", rendered),
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} string(s) failed to translate", failures, requests.len()));
    }
    Ok(())
}
