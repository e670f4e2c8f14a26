//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for studystack-admin using clap's derive macros.

use clap::{Parser, Subcommand, ValueEnum};

/// Study Stack admin backend
#[derive(Parser, Debug)]
#[command(name = "studystack-admin")]
#[command(version)]
#[command(about = "Admin backend for the Study Stack platform", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Print dashboard counts
    Stats,

    /// Export a list to CSV, paging through every matching record
    Export {
        #[arg(value_enum)]
        kind: ExportKind,

        /// Output file (defaults to a timestamped name)
        #[arg(long, short = 'o')]
        output: Option<String>,

        /// Free-text search on name
        #[arg(long)]
        search: Option<String>,

        /// Role filter (users only)
        #[arg(long)]
        role: Option<String>,

        /// Semester filter (subjects only)
        #[arg(long)]
        semester: Option<String>,
    },

    /// Write a sample config.toml
    GenerateConfig {
        #[arg(long, short = 'o', default_value = "config.example.toml")]
        output: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Users,
    Subjects,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Users => "users",
            ExportKind::Subjects => "subjects",
        }
    }
}
