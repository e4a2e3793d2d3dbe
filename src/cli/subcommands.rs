use crate::state::TimePreset;
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum StateCommand {
    /// Print the current filter state and its combined queries
    Show,
    /// Merge a natural-language query into the current query
    Nl { text: String },
    /// Set the raw search term
    Search { term: String },
    /// Toggle a quick-filter tag
    Quick { tag: String },
    /// Store a regex pattern (reported, not applied, when invalid)
    Regex { pattern: String },
    /// Select a time window ending now
    Time {
        #[arg(value_enum)]
        preset: PresetWindow,
    },
    /// Toggle a checkbox facet value
    Facet { field: String, value: String },
    /// Remove one facet selection, or all with --all
    ClearFacet {
        field: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Reset to the empty filter
    Clear,
}

/// Command-line names for the time presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetWindow {
    LastHour,
    Last24h,
    Last7d,
    Last30d,
    Last90d,
}

impl From<PresetWindow> for TimePreset {
    fn from(window: PresetWindow) -> Self {
        match window {
            PresetWindow::LastHour => TimePreset::LastHour,
            PresetWindow::Last24h => TimePreset::Last24h,
            PresetWindow::Last7d => TimePreset::Last7d,
            PresetWindow::Last30d => TimePreset::Last30d,
            PresetWindow::Last90d => TimePreset::Last90d,
        }
    }
}

#[derive(Subcommand)]
pub enum PresetCommand {
    /// List saved presets
    List,
    /// Save the current filter state as a preset
    Save {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        public: bool,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long, env = "USER", default_value = "")]
        created_by: String,
    },
    /// Delete a preset by id
    Delete { id: String },
    /// Load a preset into the current filter state
    Apply { id: String },
    /// Write a preset to a standalone JSON file
    Export {
        id: String,
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Append a preset from an exported JSON file
    Import { file: PathBuf },
    /// Print a shareable link for a preset
    Share { id: String },
    /// Decode a shareable link
    Decode { link: String },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Show recent searches, newest first
    List {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete the search history
    Clear,
}
