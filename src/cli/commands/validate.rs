//! Validate command
//!
//! Runs structural validation and prints every finding without writing
//! templates.

use super::{CommandContext, EXIT_VALIDATION_FAILED};
use anyhow::Result;
use clap::Parser;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Stacks to validate (all when omitted)
    pub stacks: Vec<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let app = ctx.app()?;
        let reports: Vec<_> = app
            .select(&self.stacks)?
            .into_iter()
            .map(|stack| stack.validate())
            .collect();

        let failed = reports
            .iter()
            .any(|r| r.has_errors() || (self.strict && r.warning_count() > 0));

        if ctx.output.is_json() {
            ctx.output.json(&reports, ctx.pretty_json());
        } else {
            for report in &reports {
                ctx.output.report(report);
            }
            let warnings: usize = reports.iter().map(|r| r.warning_count()).sum();
            if failed {
                ctx.output.error("Validation failed");
            } else if warnings > 0 {
                ctx.output
                    .warning(&format!("All stacks are valid with {} warning(s)", warnings));
            } else {
                ctx.output.success("All stacks are valid");
            }
        }

        Ok(if failed { EXIT_VALIDATION_FAILED } else { 0 })
    }
}
