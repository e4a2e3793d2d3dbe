mod subcommands;

use crate::export::{DateFormat, Delimiter, ExportFormat};
use crate::serializer::Dialect;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
pub use subcommands::{HistoryCommand, PresetCommand, PresetWindow, StateCommand};

/// Build, persist and export DNS record filters
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file
    #[arg(long, global = true, env = "DNS_QUERY_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to color text output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// More log output on stderr (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pin "now" to an RFC 3339 instant instead of the wall clock
    #[arg(long, global = true)]
    pub now: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a natural-language query and show the rule tree and queries
    Parse {
        /// Free text, e.g. "MX records for example.com with priority < 20"
        text: String,

        /// Which query dialects to render
        #[arg(short, long, value_enum, default_value_t = Dialect::All)]
        dialect: Dialect,
    },
    /// List the record fields and the operators offered for each
    Fields,
    /// Apply a query to a file of rows
    Filter {
        /// JSON (or JSON5) array of row objects
        #[arg(short, long)]
        input: PathBuf,

        /// Natural-language query; the persisted filter state is used when absent
        #[arg(short = 't', long)]
        query: Option<String>,

        /// Do not record the search in the history log
        #[arg(long)]
        no_history: bool,
    },
    /// Count facet values over a file of rows
    Facets {
        #[arg(short, long)]
        input: PathBuf,

        /// Fields to facet on
        #[arg(
            short = 'F',
            long = "field",
            default_values_t = ["type".to_string(), "zone".to_string()]
        )]
        fields: Vec<String>,
    },
    /// Export a file of rows as CSV, JSON or XML
    Export {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'x', long, value_enum, default_value_t = ExportFormat::Csv)]
        export_format: ExportFormat,

        /// Comma-separated output columns, in order
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        #[arg(long, value_enum)]
        date_format: Option<DateFormat>,

        #[arg(long, value_enum)]
        delimiter: Option<Delimiter>,

        /// Omit the CSV header row
        #[arg(long)]
        no_headers: bool,

        /// Wrap JSON/XML output with export metadata
        #[arg(long)]
        metadata: bool,

        /// Only export rows matching the persisted filter state
        #[arg(long)]
        filtered: bool,

        /// Directory the file is written to
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Inspect or change the persisted filter state
    State {
        /// Page URL carrying a `filter` parameter to hydrate from and rewrite
        #[arg(long, global = true)]
        url: Option<String>,

        #[command(subcommand)]
        action: StateCommand,
    },
    /// Manage saved filter presets
    Presets {
        #[command(subcommand)]
        action: PresetCommand,
    },
    /// Show or clear the search history
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
