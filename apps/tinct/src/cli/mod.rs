//! # tinct CLI Module
//!
//! This module implements the CLI interface for tinct.
//!
//! ## Available Commands
//!
//! - `build` - Render the theme and write the output files
//! - `check` - Resolve and format without writing, report diagnostics
//! - `resolve` - Show the style a single group resolves to

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tinct_core::TinctError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// tinct - Theme Generator
///
/// Resolves highlight groups from TOML theme files and renders them as
/// editor colorschemes.
#[derive(Parser, Debug)]
#[command(name = "tinct")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress human-readable summaries
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Theme file; repeat to layer several themes, later ones win
    #[arg(short, long, global = true, default_value = "theme.toml")]
    pub theme: Vec<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output formats a build can render.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputFormat {
    /// Vim colorscheme (`colors/<name>.vim`)
    Vim,
    /// JSON document (`<name>.json`)
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the theme and write output files
    Build {
        /// Output directory
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,

        /// Formats to render (repeatable)
        #[arg(short, long, value_enum, default_values_t = [OutputFormat::Vim, OutputFormat::Json])]
        format: Vec<OutputFormat>,

        /// Print rendered files instead of writing them
        #[arg(long)]
        stdout: bool,
    },

    /// Resolve and format the theme without writing anything
    Check {
        /// Treat diagnostics as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show the style a group resolves to
    Resolve {
        /// Group name, e.g. `Comment` or `@comment`
        group: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), TinctError> {
    let output = Output {
        json_mode: cli.json_mode,
        quiet: cli.quiet,
    };

    match cli.command {
        Some(Commands::Build {
            out,
            format,
            stdout,
        }) => cmd_build(&cli.theme, &out, &format, stdout, output),
        Some(Commands::Check { strict }) => cmd_check(&cli.theme, strict, output),
        Some(Commands::Resolve { group }) => cmd_resolve(&cli.theme, &group, output),
        None => {
            // No subcommand - check by default
            cmd_check(&cli.theme, false, output)
        }
    }
}
