//! Synth command
//!
//! Validates the selected stacks and writes one template per stack plus a
//! manifest into the output directory.

use super::{CommandContext, EXIT_VALIDATION_FAILED};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vpc_topologies::app::MANIFEST_FILE;
use vpc_topologies::Error;

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Stacks to synthesize (all when omitted)
    pub stacks: Vec<String>,

    /// Output directory (defaults to the configured one)
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

impl SynthArgs {
    /// Execute the synth command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let app = ctx.app()?;
        let out_dir = self
            .out
            .clone()
            .unwrap_or_else(|| ctx.config.output_dir().to_path_buf());

        let manifest = match app.synth(&self.stacks, &out_dir) {
            Ok(manifest) => manifest,
            Err(Error::Validation { report, .. }) => {
                if ctx.output.is_json() {
                    ctx.output.json(&report, ctx.pretty_json());
                } else {
                    ctx.output.report(&report);
                    ctx.output.error("Synthesis aborted; no templates were written");
                }
                return Ok(EXIT_VALIDATION_FAILED);
            }
            Err(e) => return Err(e.into()),
        };

        if ctx.output.is_json() {
            ctx.output.json(&manifest, ctx.pretty_json());
            return Ok(0);
        }

        for (name, entry) in &manifest.stacks {
            ctx.output.success(&format!(
                "{} ({} resources) -> {}",
                name,
                entry.resources,
                out_dir.join(&entry.template_file).display()
            ));
        }
        ctx.output
            .info(&format!("Manifest: {}", out_dir.join(MANIFEST_FILE).display()));

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synth_args_parsing() {
        let args = SynthArgs::try_parse_from(["synth", "hybrid-architecture-demo", "-o", "out"]).unwrap();
        assert_eq!(args.stacks, vec!["hybrid-architecture-demo"]);
        assert_eq!(args.out, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_synth_defaults_to_all_stacks() {
        let args = SynthArgs::try_parse_from(["synth"]).unwrap();
        assert!(args.stacks.is_empty());
        assert!(args.out.is_none());
    }
}
