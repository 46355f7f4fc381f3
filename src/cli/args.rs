//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::ObjectKind;

/// Load LST data files into an object graph and report what happened
#[derive(Parser, Debug)]
#[command(name = "lstloader")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every source of a plan and print a summary with diagnostics
    Load {
        /// TOML load plan
        #[arg(value_hint = ValueHint::FilePath)]
        plan: PathBuf,

        /// Let newer-dated sources replace older definitions
        #[arg(long)]
        allow_override: bool,
    },

    /// Load a plan and print the resulting object graph as a tree
    Tree {
        /// TOML load plan
        #[arg(value_hint = ValueHint::FilePath)]
        plan: PathBuf,

        /// Only show objects of this kind
        #[arg(short, long, value_parser = parse_kind)]
        kind: Option<ObjectKind>,
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

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Directory holding a local .lstloader.toml
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}

fn parse_kind(s: &str) -> Result<ObjectKind, String> {
    s.parse::<ObjectKind>().map_err(|e| e.to_string())
}
