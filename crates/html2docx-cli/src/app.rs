//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use html2docx_core::headings::paragraph_levels;
use html2docx_core::{count_page_fields, language_coverage, ConversionRequest, Pipeline, Settings};
use html2docx_ooxml::Document;

/// Settings file picked up from the working directory
const DEFAULT_CONFIG: &str = "html2docx.toml";

#[derive(Parser)]
#[command(name = "html2docx")]
#[command(author, version, about = "HTML to styled DOCX", long_about = None)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HTML file to DOCX
    Convert(ConvertOptions),

    /// Show headings, metadata, language tags and page numbers of a DOCX
    Inspect {
        /// Input DOCX file
        input: PathBuf,

        /// Configuration file path (for the expected locale)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Options of the convert command
#[derive(Args, Debug, Clone)]
pub struct ConvertOptions {
    /// Input HTML file
    pub input: PathBuf,

    /// Output DOCX file (default: <title>.docx in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    pub title: Option<String>,

    /// Level the heading hierarchy starts at (1-9)
    #[arg(short, long, default_value_t = 1)]
    pub start_level: u8,

    /// Keep bold/italic as direct formatting only
    #[arg(long)]
    pub no_strong_emph: bool,

    /// Reference DOCX providing named styles
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// pandoc program name or path
    #[arg(long)]
    pub pandoc: Option<String>,

    /// Use the built-in converter only
    #[arg(long)]
    pub fallback_only: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the CLI application
///
/// Parses arguments, sets up logging and dispatches to the command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert(options) => {
            let (output, backend) = convert_command(&options)?;
            println!("Wrote {} ({backend} backend)", output.display());
        }
        Commands::Inspect { input, config } => {
            inspect_command(&input, config.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    // A second init (tests) is harmless
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

/// Execute the convert command, returning the written path and backend
pub fn convert_command(options: &ConvertOptions) -> Result<(PathBuf, html2docx_core::BackendKind)> {
    if !options.input.exists() {
        anyhow::bail!("Input file not found: {}", options.input.display());
    }

    let mut settings = load_settings(options.config.as_deref())?;
    if let Some(template) = &options.template {
        settings.backend.template = Some(template.clone());
    }
    if let Some(pandoc) = &options.pandoc {
        settings.backend.pandoc = pandoc.clone();
    }
    if options.fallback_only {
        settings.backend.fallback_only = true;
    }

    let html = fs::read_to_string(&options.input)
        .with_context(|| format!("Failed to read {}", options.input.display()))?;

    let mut request = ConversionRequest::new(html)
        .with_start_level(options.start_level)
        .with_strong_emph(!options.no_strong_emph);
    if let Some(title) = &options.title {
        request = request.with_title(title.clone());
    }
    request.validate()?;

    let pipeline = Pipeline::new(settings);
    let converted = pipeline
        .convert(&request)
        .with_context(|| format!("Failed to convert {}", options.input.display()))?;

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&converted.file_name));
    fs::write(&output, &converted.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok((output, converted.backend))
}

/// Execute the inspect command
pub fn inspect_command(input: &Path, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let document =
        Document::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    print!("{}", inspect_report(&document, &settings.document.locale));
    Ok(())
}

/// Human-readable summary of a document
pub fn inspect_report(document: &Document, locale: &str) -> String {
    let mut out = String::new();

    let core = document.core_properties();
    let title = core.and_then(|c| c.title()).unwrap_or_else(|| "-".to_string());
    let language = core.and_then(|c| c.language()).unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "Title: {title}");
    let _ = writeln!(out, "Language: {language}");

    let _ = writeln!(out, "Headings:");
    let levels = paragraph_levels(document);
    let mut any = false;
    for (paragraph, level) in document.paragraphs().zip(levels) {
        if let Some(level) = level {
            any = true;
            let indent = "  ".repeat(usize::from(level));
            let _ = writeln!(out, "{indent}{level} {}", paragraph.text());
        }
    }
    if !any {
        let _ = writeln!(out, "  (none)");
    }

    let (tagged, total) = language_coverage(document, locale);
    let percent = if total == 0 { 100 } else { tagged * 100 / total };
    let _ = writeln!(out, "Runs tagged {locale}: {tagged}/{total} ({percent}%)");

    let _ = writeln!(out, "Footers:");
    for section in 0..document.sections().len() {
        match document.default_footer_path(section) {
            Some(path) => {
                let fields = document.footer(&path).map(count_page_fields).unwrap_or(0);
                let _ = writeln!(
                    out,
                    "  section {}: {path}, {fields} PAGE field(s)",
                    section + 1
                );
            }
            None => {
                let _ = writeln!(out, "  section {}: no default footer", section + 1);
            }
        }
    }

    out
}

/// Load settings from a config file or use defaults
fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => {
            let candidate = Path::new(DEFAULT_CONFIG);
            if candidate.exists() {
                match Settings::load(candidate) {
                    Ok(settings) => return Ok(settings),
                    Err(e) => log::warn!("ignoring {DEFAULT_CONFIG}: {e}"),
                }
            }
            Ok(Settings::default())
        }
    }
}
