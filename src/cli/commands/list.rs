//! List command
//!
//! Shows the registered stacks with their region and size.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;

/// Arguments for the list command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Also print every logical id
    #[arg(long)]
    pub resources: bool,
}

#[derive(Serialize)]
struct StackSummary<'a> {
    name: &'a str,
    region: &'a str,
    availability_zones: &'a [String],
    resources: usize,
    outputs: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    logical_ids: Vec<&'a str>,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let app = ctx.app()?;

        let summaries: Vec<StackSummary<'_>> = app
            .stacks()
            .map(|stack| StackSummary {
                name: stack.name(),
                region: stack.region(),
                availability_zones: stack.availability_zones(),
                resources: stack.len(),
                outputs: stack.outputs().count(),
                logical_ids: if self.resources {
                    stack.resources().map(|(id, _)| id.as_str()).collect()
                } else {
                    Vec::new()
                },
            })
            .collect();

        if ctx.output.is_json() {
            ctx.output.json(&summaries, ctx.pretty_json());
            return Ok(0);
        }

        for summary in &summaries {
            ctx.output.plain(&format!(
                "{:<28} {:<16} {:>3} resources {:>2} outputs",
                summary.name, summary.region, summary.resources, summary.outputs
            ));
            for id in &summary.logical_ids {
                ctx.output.plain(&format!("    {}", id));
            }
        }

        Ok(0)
    }
}
