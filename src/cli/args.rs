//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// Narrow a table of options down to an explainable shortlist: filter, score, and explore
#[derive(Parser, Debug)]
#[command(name = "shortlist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Settings file layered over the global config (TOML or JSON)
    #[arg(short, long, global = true, env = "SHORTLIST_CONFIG_FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter, score and build both trees for a dataset
    Run {
        /// Dataset file (JSON array of records)
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
        /// Which tree(s) to print
        #[arg(long, value_enum, default_value_t = TreeChoice::Both)]
        tree: TreeChoice,
        /// Number of ranked options to print (default: display.top)
        #[arg(long)]
        top: Option<usize>,
        /// Print the full snapshot as JSON instead of the report
        #[arg(long)]
        json: bool,
        /// Also write the snapshot as JSON to this file
        #[arg(long, value_hint = ValueHint::FilePath)]
        export: Option<PathBuf>,
    },

    /// Show column classifications and their roles
    Columns {
        /// Dataset file
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
    },

    /// Explain which constraints remove which options
    Diagnose {
        /// Dataset file
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
        /// Number of failing options to list
        #[arg(long, default_value_t = 10)]
        sample: usize,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings as TOML
    Show,
    /// Show global config file location
    Path,
    /// Print a commented config template
    Template,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChoice {
    Exploration,
    Regression,
    Both,
}

impl TreeChoice {
    pub fn exploration(self) -> bool {
        matches!(self, TreeChoice::Exploration | TreeChoice::Both)
    }

    pub fn regression(self) -> bool {
        matches!(self, TreeChoice::Regression | TreeChoice::Both)
    }
}
