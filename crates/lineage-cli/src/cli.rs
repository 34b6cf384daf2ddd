//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use lineage::graph::Orientation;
use lineage::{LayoutConfig, SortOrder};
use std::path::PathBuf;

/// Lineage - version-lineage graph administration
#[derive(Parser, Debug)]
#[command(name = "lineage", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LINEAGE_CONFIG")]
    pub config: Option<String>,

    /// Project id (defaults to `default_project` from the config)
    #[arg(short, long, global = true, env = "LINEAGE_PROJECT")]
    pub project: Option<String>,

    /// Directory holding the relationship and archive documents
    #[arg(long, global = true, env = "LINEAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Log filter implied by `-v` flags, if any.
    pub fn verbosity_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new version, optionally under a parent
    Add {
        /// Version id
        id: String,
        /// Parent version id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete versions, re-parenting their children
    Delete {
        /// Version ids, deleted in order
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Toggle or set a version's archive flag
    Archive {
        /// Version id
        id: String,
        /// Set the flag explicitly instead of toggling
        #[arg(long, value_name = "BOOL")]
        set: Option<bool>,
    },
    /// List archived versions
    Archived,
    /// Drop every id not in the given set
    Cleanup {
        /// Valid version ids
        #[arg(conflicts_with = "versions")]
        ids: Vec<String>,
        /// Read valid ids from a versions JSON file
        #[arg(long)]
        versions: Option<PathBuf>,
    },
    /// Report roots, orphans and cycles, or a single version's neighbourhood
    Inspect {
        /// Version to show
        version: Option<String>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute render positions for a versions JSON file
    Layout {
        /// Versions JSON file (`[{id, parentId, metrics}]`)
        versions: PathBuf,
        /// Spacing preset
        #[arg(long, value_enum, default_value_t = Preset::Detail)]
        preset: Preset,
        /// Sort by this metric title and use the linear layout
        #[arg(long)]
        sort_by: Option<String>,
        /// Metric type paired with `--sort-by`
        #[arg(long, default_value = "")]
        metric_type: String,
        /// Sort direction for `--sort-by`
        #[arg(long, value_enum, default_value_t = Order::Best)]
        order: Order,
        /// Direction of the linear layout
        #[arg(long, value_enum, default_value_t = Direction::Vertical)]
        direction: Direction,
        /// Keep archived versions
        #[arg(long)]
        include_archived: bool,
    },
    /// Enrich a versions JSON file with differences, trends and flags
    Enrich {
        /// Versions JSON file (`[{id, parentId, metrics}]`)
        versions: PathBuf,
        /// Take parents from the stored relationships instead of the file
        #[arg(long)]
        from_store: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key
    Get {
        /// Dotted key, e.g. `layout.detail.center_x`
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target path (defaults to the standard location)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

/// Layout spacing preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Main view.
    Detail,
    /// Minimap.
    Miniature,
}

impl Preset {
    /// Picks the preset from configured values.
    pub fn select(self, detail: &LayoutConfig, miniature: &LayoutConfig) -> LayoutConfig {
        match self {
            Self::Detail => detail.clone(),
            Self::Miniature => miniature.clone(),
        }
    }
}

/// Sort direction flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Order {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
    /// Best first per the metric's optimization target.
    Best,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
            Order::Best => SortOrder::BestFirst,
        }
    }
}

/// Linear layout direction flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Top to bottom.
    Vertical,
    /// Left to right.
    Horizontal,
}

impl From<Direction> for Orientation {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Vertical => Orientation::Vertical,
            Direction::Horizontal => Orientation::Horizontal,
        }
    }
}
