//! Output formatting module for vpc-topologies
//!
//! Provides colored human output and line-delimited JSON.

use colored::Colorize;
use serde::Serialize;

use vpc_topologies::validate::{Severity, ValidationReport, Violation};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);

        Self {
            use_color,
            json_mode,
            verbosity,
        }
    }

    /// Whether JSON output is active
    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a value as one JSON document
    pub fn json<T: Serialize>(&self, value: &T, pretty: bool) {
        let rendered = if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match rendered {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to render JSON: {}", e)),
        }
    }

    /// Print a plain line (always shows)
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "OK:".green().bold(), message);
        } else {
            println!("OK: {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print one violation
    pub fn violation(&self, violation: &Violation) {
        let resource = violation.resource.as_deref().unwrap_or("-");
        if !self.use_color {
            println!("  {}", violation);
            return;
        }

        let label = match violation.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!(
            "  [{}] {} {}: {}",
            violation.rule_id.bright_black(),
            label,
            resource.bright_white(),
            violation.message
        );
    }

    /// Print a validation report in human form
    pub fn report(&self, report: &ValidationReport) {
        self.section(&report.stack);
        for violation in &report.violations {
            self.violation(violation);
        }

        let summary = report.summary();
        if report.has_errors() {
            if self.use_color {
                println!("{}", summary.red().bold());
            } else {
                println!("{}", summary);
            }
        } else if self.use_color {
            println!("{}", summary.green());
        } else {
            println!("{}", summary);
        }
    }
}
