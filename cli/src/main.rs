//! fcref CLI - find spreadsheet references in FreeCAD documents
//!
//! A command-line tool for searching `.FCStd` archives for references to
//! spreadsheet aliases and variables, and for tidying document folders.

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use fcref::render::{self, Highlight, JsonFormat, RenderOptions};
use fcref::{FinderOptions, ReferenceFinder, SearchRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Find spreadsheet alias references inside FreeCAD documents
#[derive(Parser)]
#[command(
    name = "fcref",
    version,
    about = "Find spreadsheet references in FreeCAD .FCStd files",
    long_about = "fcref - search FreeCAD document archives for references to spreadsheet\n\
                  aliases and variables without extracting them."
)]
struct Cli {
    /// Increase diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find references to `document#spreadsheet.alias`
    FindRefs {
        /// Document name or label where the spreadsheet lives
        document: String,

        /// Spreadsheet name or label
        spreadsheet: String,

        /// Cell alias (default: any alias of the spreadsheet)
        alias: Option<String>,

        /// Report spreadsheet cells and expression bindings from Document.xml
        /// instead of raw lines
        #[arg(long)]
        structured: bool,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Find references to a variable of the master spreadsheet
    FindVariableRefs {
        /// Variable (alias) name
        variable: String,

        /// Document identifier in its on-disk form; repeat for each form
        /// (default: Master and &lt;&lt;Master&gt;&gt;)
        #[arg(long = "document", value_name = "ID")]
        documents: Vec<String>,

        /// Spreadsheet identifier (default: Spreadsheet)
        #[arg(long, value_name = "ID")]
        spreadsheet: Option<String>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Extract every .FCStd file in a directory into `<stem>/`
    Unzip {
        /// Directory holding the archives
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Delete .FCStd1 backup files recursively
    CleanBackups {
        /// Directory to clean
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// List the backups without deleting them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

/// Options shared by the search commands.
#[derive(Args)]
struct ScanArgs {
    /// Directory to scan recursively
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// How to mark the matched term
    #[arg(long, default_value = "auto")]
    highlight: HighlightMode,

    /// Prefix each line with the archive member it came from
    #[arg(long)]
    show_member: bool,
}

/// Output format
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Grep-style text
    Text,
    /// Pretty-printed JSON
    Json,
    /// Single-line JSON
    JsonCompact,
}

/// Highlight mode
#[derive(Clone, Copy, ValueEnum)]
enum HighlightMode {
    /// Colors on a terminal, brackets otherwise
    Auto,
    /// Always use colors
    Color,
    /// Wrap the term in [[ ]]
    Brackets,
    /// No highlighting
    Plain,
}

impl HighlightMode {
    fn resolve(self) -> Highlight {
        match self {
            HighlightMode::Auto if io::stdout().is_terminal() => Highlight::Color,
            HighlightMode::Auto => Highlight::Brackets,
            HighlightMode::Color => {
                colored::control::set_override(true);
                Highlight::Color
            }
            HighlightMode::Brackets => Highlight::Brackets,
            HighlightMode::Plain => Highlight::Plain,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                println!("{}", e.render());
                std::process::exit(1);
            }
        },
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        if let Some(fcref::Error::Usage(_)) = e.downcast_ref::<fcref::Error>() {
            println!("{}", e);
        } else {
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::FindRefs {
            document,
            spreadsheet,
            alias,
            structured,
            scan,
        } => {
            let request = SearchRequest::alias(document, spreadsheet, alias);
            let finder = ReferenceFinder::new(FinderOptions::default());
            if structured {
                let pb = create_spinner("Scanning documents...");
                let matches = finder.find_structured(&scan.root, &request);
                pb.finish_and_clear();
                let matches = matches?;

                let output = match scan.format {
                    OutputFormat::Text => render::structured_to_text(&matches),
                    OutputFormat::Json => render::to_json(&matches, JsonFormat::Pretty)? + "\n",
                    OutputFormat::JsonCompact => {
                        render::to_json(&matches, JsonFormat::Compact)? + "\n"
                    }
                };
                write_output(&output)?;
            } else {
                search(&finder, &request, &scan)?;
            }
        }

        Commands::FindVariableRefs {
            variable,
            documents,
            spreadsheet,
            scan,
        } => {
            let mut options = FinderOptions::default();
            if !documents.is_empty() {
                options = options.with_variable_documents(documents);
            }
            if let Some(spreadsheet) = spreadsheet {
                options = options.with_variable_spreadsheet(spreadsheet);
            }
            let finder = ReferenceFinder::new(options);
            search(&finder, &SearchRequest::variable(variable), &scan)?;
        }

        Commands::Unzip { dir } => {
            let pb = create_spinner("Extracting archives...");
            let extracted = fcref::unzip_all(&dir);
            pb.finish_and_clear();

            let extracted = extracted?;
            for target in &extracted {
                println!("{} {}", "✓".green().bold(), target.display());
            }
            if extracted.is_empty() {
                println!("{} No .FCStd files in {}", "!".yellow().bold(), dir.display());
            }
        }

        Commands::CleanBackups { root, dry_run } => {
            let backups = fcref::remove_backups(&root, dry_run)?;
            for backup in &backups {
                println!("{}", backup.display());
            }
            if backups.is_empty() {
                println!("{} No backup files found", "!".yellow().bold());
            } else if dry_run {
                println!("{} {} backups would be removed", "!".yellow().bold(), backups.len());
            } else {
                println!("{} Removed {} backups", "✓".green().bold(), backups.len());
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn search(
    finder: &ReferenceFinder,
    request: &SearchRequest,
    scan: &ScanArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_spinner("Scanning archives...");
    let reports = finder.find(&scan.root, request);
    pb.finish_and_clear();
    let reports = reports?;

    let output = match scan.format {
        OutputFormat::Text => {
            let options = RenderOptions::new()
                .with_highlight(scan.highlight.resolve())
                .with_show_member(scan.show_member);
            render::to_text(&reports, &options)
        }
        OutputFormat::Json => render::to_json(&reports, JsonFormat::Pretty)? + "\n",
        OutputFormat::JsonCompact => render::to_json(&reports, JsonFormat::Compact)? + "\n",
    };
    write_output(&output)
}

fn print_version() {
    println!("{} {}", "fcref".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Find spreadsheet references in FreeCAD documents");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(content: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(content.as_bytes())?;
    handle.flush()?;
    Ok(())
}
