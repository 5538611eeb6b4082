//! Subcommands module for vpc-topologies CLI
//!
//! This module contains all the subcommand implementations.

pub mod graph;
pub mod list;
pub mod synth;
pub mod validate;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use vpc_topologies::app::App;
use vpc_topologies::config::Config;

/// Exit status when validation reports errors
pub const EXIT_VALIDATION_FAILED: i32 = 2;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.output.color;
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity());

        Self { config, output }
    }

    /// Declare every enabled topology
    pub fn app(&self) -> Result<App> {
        let app = self.config.build_app()?;
        self.output
            .info(&format!("Registered stacks: {}", app.names().join(", ")));
        Ok(app)
    }

    /// Whether JSON output should be pretty-printed
    pub fn pretty_json(&self) -> bool {
        self.config.output.pretty
    }
}
