//! CLI module for vpc-topologies
//!
//! This module provides the command-line interface: argument parsing and
//! subcommand dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vpc-topologies - declare, validate and synthesize demo VPC topologies
///
/// Builds the hybrid, site-to-site VPN and private access stacks and writes
/// them out as CloudFormation templates.
#[derive(Parser, Debug, Clone)]
#[command(name = "vpc-topologies")]
#[command(author = "vpc-topologies Contributors")]
#[command(version)]
#[command(about = "Declare, validate and synthesize demo VPC topologies", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "VPC_TOPOLOGIES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List registered stacks
    List(commands::list::ListArgs),

    /// Validate stacks and write their templates
    Synth(commands::synth::SynthArgs),

    /// Validate stacks and print the report
    Validate(commands::validate::ValidateArgs),

    /// Show the dependency graph of a stack
    Graph(commands::graph::GraphArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["vpc-topologies", "synth", "private-access-demo"]).unwrap();
        match cli.command {
            Commands::Synth(args) => assert_eq!(args.stacks, vec!["private-access-demo"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["vpc-topologies", "-vvvvv", "list"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vpc-topologies", "list", "--output", "json", "--no-color"])
            .unwrap();
        assert!(cli.is_json());
        assert!(cli.no_color);
    }

    #[test]
    fn test_graph_requires_stack() {
        assert!(Cli::try_parse_from(["vpc-topologies", "graph"]).is_err());
    }
}
