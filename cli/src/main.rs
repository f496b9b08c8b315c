//! docxbook CLI - DOCX to DocBook conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docxbook::package::{format_size, ROOT_FILE};
use docxbook::render::{DocBookGenerator, ExtractionStats};
use docxbook::server::{start_server, ApiState};
use docxbook::validate::Severity;
use docxbook::{
    Config, ConvertOptions, ConvertResult, EditorSession, Extractor, Orchestrator, Packager,
    Schema, ValidationReport, Validator,
};

#[derive(Parser)]
#[command(name = "docxbook")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert DOCX documents to DocBook XML packages", long_about = None)]
struct Cli {
    /// Input DOCX file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, global = true, env = "DOCXBOOK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    flags: ConvertFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every converting command.
#[derive(clap::Args, Clone, Default)]
struct ConvertFlags {
    /// Target schema
    #[arg(long, value_enum, global = true, env = "DOCXBOOK_SCHEMA")]
    schema: Option<SchemaArg>,

    /// Emit a table of contents
    #[arg(long, global = true)]
    toc: bool,

    /// Skip the zip package
    #[arg(long, global = true)]
    no_package: bool,

    /// Skip image extraction
    #[arg(long, global = true)]
    no_images: bool,

    /// Render tables as paragraphs
    #[arg(long, global = true)]
    no_tables: bool,

    /// Minimum image width/height in pixels
    #[arg(long, global = true, env = "DOCXBOOK_MIN_IMAGE_SIZE", value_name = "PX")]
    min_image_size: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert DOCX to DocBook XML, package and validation report
    Convert {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Run the conversion service
    Serve {
        /// Bind address
        #[arg(long, env = "DOCXBOOK_HOST")]
        host: Option<String>,

        /// Bind port
        #[arg(short, long, env = "DOCXBOOK_PORT")]
        port: Option<u16>,

        /// Root directory for job output
        #[arg(short, long, env = "DOCXBOOK_OUTPUT_DIR", value_name = "DIR")]
        output: Option<PathBuf>,

        /// Number of concurrent conversions
        #[arg(long, env = "DOCXBOOK_WORKERS")]
        workers: Option<usize>,

        /// DocBook file to serve in the editor
        #[arg(long, value_name = "FILE")]
        document: Option<PathBuf>,

        /// Zip package kept in sync with editor saves
        #[arg(long, value_name = "FILE", requires = "document")]
        package: Option<PathBuf>,
    },

    /// Validate a DocBook XML file
    Validate {
        /// DocBook XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Render a DocBook XML file as HTML
    Html {
        /// DocBook XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaArg {
    /// RittDoc DocBook 4.3 variant
    Rittdoc,
    /// OASIS DocBook XML 4.2
    Docbook42,
}

impl From<SchemaArg> for Schema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Rittdoc => Schema::RittDoc,
            SchemaArg::Docbook42 => Schema::DocBook42,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_filter()),
    )
    .init();

    let options = apply_flags(config.convert_options(), &cli.flags);

    let result = match cli.command {
        Some(Commands::Convert { input, output }) => {
            let output = output.unwrap_or_else(|| config.output.output_dir.clone());
            cmd_convert(&input, &output, &options, cli.quiet)
        }
        Some(Commands::Serve {
            host,
            port,
            output,
            workers,
            document,
            package,
        }) => {
            let mut config = config;
            config.extraction = options.extract.clone();
            config.generation = options.docbook.clone();
            config.output.create_package = options.create_package;
            if let Some(host) = host {
                config.service.host = host;
            }
            if let Some(port) = port {
                config.service.port = port;
            }
            if let Some(dir) = output {
                config.output.output_dir = dir;
            }
            if let Some(workers) = workers {
                config.service.max_concurrent_jobs = workers;
            }
            cmd_serve(&config, document.as_deref(), package.as_deref())
        }
        Some(Commands::Validate { input, json }) => {
            cmd_validate(&input, options.docbook.schema, json)
        }
        Some(Commands::Info { input }) => cmd_info(&input, &options),
        Some(Commands::Html { input, output }) => cmd_html(&input, output.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                let output = cli
                    .output
                    .unwrap_or_else(|| config.output.output_dir.clone());
                cmd_convert(&input, &output, &options, cli.quiet)
            } else {
                println!("{}", "Usage: docxbook <FILE> [OUTPUT]".yellow());
                println!("Run 'docxbook --help' for more information.");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

fn apply_flags(mut options: ConvertOptions, flags: &ConvertFlags) -> ConvertOptions {
    if let Some(schema) = flags.schema {
        options.docbook.schema = schema.into();
    }
    if flags.toc {
        options.docbook.include_toc = true;
    }
    if flags.no_package {
        options.create_package = false;
    }
    if flags.no_images {
        options.extract.extract_images = false;
    }
    if flags.no_tables {
        options.extract.extract_tables = false;
    }
    if let Some(size) = flags.min_image_size {
        options.extract.min_image_size = size;
    }
    options
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

fn cmd_convert(
    input: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(4)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    // Extract
    pb.set_message("Extracting content...");
    let model = Extractor::new(options.extract.clone()).extract_file(input)?;
    pb.inc(1);

    // Generate
    pb.set_message("Generating DocBook...");
    let xml = DocBookGenerator::new(options.docbook.clone()).generate(&model)?;
    pb.inc(1);

    // Package
    pb.set_message("Packaging...");
    let package = if options.create_package {
        Some(Packager::new().package(&xml, &model)?)
    } else {
        None
    };
    pb.inc(1);

    // Validate
    pb.set_message("Validating...");
    let report = options
        .validate
        .then(|| Validator::new(options.docbook.schema).validate(&xml, ROOT_FILE));
    pb.inc(1);

    let result = ConvertResult {
        stats: ExtractionStats::from_model(&model),
        model,
        xml,
        package,
        report,
    };
    let artifacts = result.write_to(output_dir, &file_stem(input))?;

    pb.finish_with_message("Done!");

    if quiet {
        return Ok(());
    }

    println!("\n{}", "Output files:".green().bold());
    for (i, artifact) in artifacts.iter().enumerate() {
        let branch = if i + 1 == artifacts.len() { "└─" } else { "├─" };
        println!(
            "  {} {} ({})",
            branch.dimmed(),
            artifact.name,
            format_size(artifact.size as usize)
        );
    }

    if let Some(report) = &result.report {
        println!();
        print_report_summary(report);
    }

    Ok(())
}

fn cmd_serve(
    config: &Config,
    document: Option<&Path>,
    package: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let orchestrator = Orchestrator::new(config.orchestrator_config())?;
    let mut state =
        ApiState::new(orchestrator).with_max_upload_bytes(config.service.max_upload_bytes());

    if let Some(path) = document {
        let mut session = EditorSession::open(path)?;
        if let Some(package) = package {
            session = session.with_package(package);
        }
        state = state.with_editor(session);
    }

    let addr = config.service.bind_address();
    println!(
        "{} http://{} ({} workers, output {})",
        "Serving on".green().bold(),
        addr,
        config.service.max_concurrent_jobs,
        config.output.output_dir.display()
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_server(&addr, state))?;
    Ok(())
}

fn cmd_validate(
    input: &Path,
    schema: Schema,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = docxbook::validate_file(input, schema)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_report_summary(&report);
        for issue in &report.issues {
            let label = match issue.severity {
                Severity::Error => issue.severity.to_string().red(),
                Severity::Warning => issue.severity.to_string().yellow(),
                Severity::Info => issue.severity.to_string().dimmed(),
            };
            println!(
                "  {} [{}] {} ({})",
                label, issue.issue_type, issue.description, issue.location
            );
        }
    }

    if report.is_valid {
        Ok(())
    } else {
        Err(format!("{} has {} error(s)", input.display(), report.total_errors).into())
    }
}

fn print_report_summary(report: &ValidationReport) {
    let verdict = if report.is_valid {
        "valid".green().bold()
    } else {
        "invalid".red().bold()
    };
    println!(
        "{} {} against {} ({} errors, {} warnings)",
        "Validation:".cyan().bold(),
        verdict,
        report.schema,
        report.total_errors,
        report.total_warnings
    );
}

fn cmd_info(input: &Path, options: &ConvertOptions) -> Result<(), Box<dyn std::error::Error>> {
    let model = Extractor::new(options.extract.clone()).extract_file(input)?;
    let stats = ExtractionStats::from_model(&model);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Title".bold(), model.title);

    if !model.metadata.authors.is_empty() {
        println!("{}: {}", "Authors".bold(), model.metadata.authors.join("; "));
    }
    if let Some(ref subject) = model.metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref keywords) = model.metadata.keywords {
        println!("{}: {}", "Keywords".bold(), keywords);
    }
    if let Some(ref created) = model.metadata.created {
        println!("{}: {}", "Created".bold(), created.to_rfc3339());
    }
    if let Some(ref modified) = model.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified.to_rfc3339());
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Chapters".bold(), stats.chapter_count);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Blocks".bold(), stats.block_count());
    println!("{}: {}", "List items".bold(), stats.list_item_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Images".bold(), stats.image_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    Ok(())
}

fn cmd_html(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let markup = fs::read_to_string(input)?;
    let html = docxbook::render::to_html(&markup)?;

    if let Some(path) = output {
        fs::write(path, &html)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docxbook".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX to DocBook XML conversion tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docxbook".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_flags() {
        let flags = ConvertFlags {
            schema: Some(SchemaArg::Docbook42),
            toc: true,
            no_package: true,
            no_images: true,
            no_tables: false,
            min_image_size: Some(8),
        };
        let options = apply_flags(ConvertOptions::default(), &flags);
        assert_eq!(options.docbook.schema, Schema::DocBook42);
        assert!(options.docbook.include_toc);
        assert!(!options.create_package);
        assert!(!options.extract.extract_images);
        assert!(options.extract.extract_tables);
        assert_eq!(options.extract.min_image_size, 8);
    }

    #[test]
    fn test_apply_no_flags_keeps_config() {
        let mut base = ConvertOptions::default();
        base.docbook.include_toc = true;
        let options = apply_flags(base.clone(), &ConvertFlags::default());
        assert_eq!(options, base);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("dir/manual.docx")), "manual");
        assert_eq!(file_stem(Path::new("")), "document");
    }

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from(["docxbook", "convert", "a.docx", "-o", "out", "--toc"])
            .unwrap();
        assert!(cli.flags.toc);
        assert!(matches!(cli.command, Some(Commands::Convert { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.json"))).is_err());
        assert!(load_config(None).is_ok());
    }
}
