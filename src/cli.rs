//! Command-line interface definitions.
//!
//! ```bash
//! # Ask for everything that is not given on the command line
//! dupsweep ~/Downloads
//!
//! # Scripted: list .jpg files ascending, check for duplicates, print JSON
//! dupsweep ~/Pictures -e .jpg -s asc -d --non-interactive -o json
//!
//! # Delete records 2 and 5 from the numbered duplicate listing
//! dupsweep ~/Downloads -d --delete 2 5 --keep-one
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::SortOrder;

/// Find files with identical content and optionally delete some of them.
///
/// Files are listed grouped by size, then (with --duplicates) hashed with
/// BLAKE3 and listed as numbered duplicate groups. Numbers picked from that
/// listing can be deleted. Options left out are asked for interactively
/// unless --non-interactive is given.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Hide progress bars, summaries and log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Only consider files whose name ends with this suffix (e.g. ".jpg")
    #[arg(short, long, value_name = "SUFFIX")]
    pub extension: Option<String>,

    /// Order of the size listing
    #[arg(short, long, value_enum, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Hash same-size files and list duplicate groups
    #[arg(short, long)]
    pub duplicates: bool,

    /// Delete the given record numbers from the duplicate listing
    ///
    /// Implies --duplicates.
    #[arg(long, value_name = "N", num_args = 1..)]
    pub delete: Option<Vec<usize>>,

    /// Refuse a selection that would delete every copy of a file
    #[arg(long)]
    pub keep_one: bool,

    /// Move deleted files to the system trash instead of removing them
    #[arg(long)]
    pub trash: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Number of threads used for hashing (default: 4)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    pub io_threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Never prompt; options not given take their defaults
    #[arg(long)]
    pub non_interactive: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Whether missing options may be asked for on stdin.
    ///
    /// JSON output keeps stdout machine-readable, so it never prompts.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !self.non_interactive && self.output == OutputFormat::Text
    }

    /// Whether duplicate checking was requested by flags alone.
    #[must_use]
    pub fn wants_duplicates(&self) -> bool {
        self.duplicates || self.delete.is_some()
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
