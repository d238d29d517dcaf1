//! backlinkz CLI tool
//!
//! Command-line interface for maintaining backlink sections in a directory of notes.
//!
//! ## Commands
//!
//! - `update [PATH]`: rewrite the "Links to this note" section of every note and print a report
//! - `id [PATH]`: print an id for a new note that no note in PATH uses yet
//! - `init [PATH]`: write a default `.backlinkz.toml`
//!
//! `update` modifies files in place, each through a temporary file renamed over the original.
//! Use `--dry-run` to see which notes would change.
//!
//! Settings come from `--config`, else `PATH/.backlinkz.toml` when present, else defaults.
//! Command-line flags override the file.

use backlinkz::{
    codec::{NoteCompiler, ReportSections},
    config::{BacklinkConfig, ConfigProvider, TomlConfigProvider},
    idgen::{default_prefix, generate_unused_id},
    BacklinkError,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "backlinkz")]
#[command(author, version, about = "Add backlinks to wiki-linked notes", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Directory of notes (default: current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// File extension of note files
    #[arg(short, long)]
    extension: Option<String>,

    /// Configuration file (default: PATH/.backlinkz.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Regular expression matching note ids
    #[arg(long)]
    id_pattern: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the backlink sections of all notes
    Update {
        #[command(flatten)]
        source: Source,

        /// Overwrite existing backlinks, even if the same
        #[arg(short, long)]
        overwrite: bool,

        /// Report what would change without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Print list of notes missing id
        #[arg(long)]
        missing: bool,

        /// Print list of broken links
        #[arg(long)]
        broken: bool,

        /// Print list of orphans
        #[arg(long)]
        orphans: bool,

        /// List a note in its own backlinks when it links to itself
        #[arg(long)]
        include_self_links: bool,

        /// Match link names against titles and file names ignoring case
        #[arg(long)]
        ignore_case: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate an unused note id for a date
    Id {
        #[command(flatten)]
        source: Source,

        /// Date or time stamp to embed in the id: YYYY, YYYYMM, ... up to YYYYMMDDHHMMSS
        /// (default: now, to the minute)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Directory of notes (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Replace an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl Source {
    fn load_config(&self) -> Result<BacklinkConfig, BacklinkError> {
        let provider = match &self.config {
            Some(path) => {
                if !path.exists() {
                    return Err(BacklinkError::Config(format!(
                        "No such config file: '{}'",
                        path.display()
                    )));
                }
                TomlConfigProvider::new(path.clone())
            }
            None => TomlConfigProvider::in_dir(&self.path),
        };
        let mut config = provider.get_config()?;
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        if let Some(id_pattern) = &self.id_pattern {
            config.id_pattern = id_pattern.clone();
        }
        Ok(config)
    }
}

fn init(path: &Path, force: bool) -> Result<(), BacklinkError> {
    if !path.is_dir() {
        return Err(BacklinkError::NotFound(format!("No such directory: '{}'", path.display())));
    }
    let provider = TomlConfigProvider::in_dir(path);
    if provider.path().exists() && !force {
        println!(
            "Config file already exists: {} (use --force to replace it)",
            provider.path().display()
        );
        return Ok(());
    }
    provider.set_config(&BacklinkConfig::default())?;
    println!("Config file created: {}", provider.path().display());
    Ok(())
}

fn run(command: Commands) -> Result<(), BacklinkError> {
    match command {
        Commands::Update {
            source,
            overwrite,
            dry_run,
            missing,
            broken,
            orphans,
            include_self_links,
            ignore_case,
            json,
        } => {
            let mut config = source.load_config()?;
            config.overwrite |= overwrite;
            config.include_self_links |= include_self_links;
            if ignore_case {
                config.case_sensitive = false;
            }

            let report = NoteCompiler::new(&source.path, config)?
                .with_dry_run(dry_run)
                .run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let sections = ReportSections {
                    missing,
                    broken,
                    orphans,
                };
                let time = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
                print!("{}", report.to_markdown(sections, &time)?);
            }
            Ok(())
        }

        Commands::Id { source, date } => {
            let config = source.load_config()?;
            let (index, _) = NoteCompiler::new(&source.path, config)?.load()?;
            let prefix = date.unwrap_or_else(default_prefix);
            println!("{}", generate_unused_id(&prefix, &index.ids())?);
            Ok(())
        }

        Commands::Init { path, force } => init(&path, force),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
