//! vpc-topologies - demo VPC topologies as CloudFormation templates
//!
//! This is the main entry point for the vpc-topologies CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpc_topologies::config::Config;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Display version if verbose
    if cli.verbosity() >= 2 {
        eprintln!("vpc-topologies v{} by {}", VERSION, AUTHORS);
    }

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity())
                .error(&format!("Failed to load config: {}", e));
            std::process::exit(e.exit_code());
        }
    };

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::List(args) => args.execute(&mut ctx),
        Commands::Synth(args) => args.execute(&mut ctx),
        Commands::Validate(args) => args.execute(&mut ctx),
        Commands::Graph(args) => args.execute(&mut ctx),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            e.downcast_ref::<vpc_topologies::Error>()
                .map_or(1, vpc_topologies::Error::exit_code)
        }
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}
