//! Graph command
//!
//! Prints the declaration graph of one stack as DOT, as a provisioning
//! order or as JSON.

use super::CommandContext;
use anyhow::Result;
use clap::{Parser, ValueEnum};

/// Graph rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GraphFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// Numbered provisioning order
    Order,
    /// Nodes and edges as JSON
    Json,
}

/// Arguments for the graph command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Stack to render
    pub stack: String,

    /// Rendering
    #[arg(long, short = 'f', value_enum, default_value_t = GraphFormat::Dot)]
    pub format: GraphFormat,
}

impl GraphArgs {
    /// Execute the graph command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let app = ctx.app()?;
        let graph = app.get(&self.stack)?.graph();

        // --output json overrides the rendering
        let format = if ctx.output.is_json() {
            GraphFormat::Json
        } else {
            self.format
        };

        match format {
            GraphFormat::Dot => print!("{}", graph.to_dot()),
            GraphFormat::Order => {
                for (position, id) in graph.provisioning_order()?.iter().enumerate() {
                    ctx.output.plain(&format!("{:>3}. {}", position + 1, id));
                }
            }
            GraphFormat::Json => ctx.output.json(&graph.export(), ctx.pretty_json()),
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_args_parsing() {
        let args = GraphArgs::try_parse_from(["graph", "demo", "--format", "order"]).unwrap();
        assert_eq!(args.stack, "demo");
        assert_eq!(args.format, GraphFormat::Order);
    }
}
