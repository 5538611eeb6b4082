//! Error types for vpc-topologies.
//!
//! Every error here is a configuration-time failure: it is raised while
//! declaring, validating or synthesizing a stack and is never retried.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationReport;

/// Result type alias for vpc-topologies operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for vpc-topologies.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Declaration Errors
    // ========================================================================
    /// A logical id was declared twice in the same stack.
    #[error("Logical id '{id}' is already declared in stack '{stack}'")]
    DuplicateLogicalId {
        /// Stack name
        stack: String,
        /// Offending logical id
        id: String,
    },

    /// A logical id does not satisfy CloudFormation naming rules.
    #[error("Invalid logical id '{id}': {message}")]
    InvalidLogicalId {
        /// Offending logical id
        id: String,
        /// Error message
        message: String,
    },

    /// A CIDR literal could not be parsed or has host bits set.
    #[error("Invalid CIDR '{literal}': {message}")]
    InvalidCidr {
        /// The literal as written
        literal: String,
        /// Error message
        message: String,
    },

    /// A dependency or output refers to a resource that was never declared.
    #[error("Resource '{id}' is not declared in stack '{stack}'")]
    UnknownResource {
        /// Stack name
        stack: String,
        /// Missing logical id
        id: String,
    },

    /// A resource was asked to depend on itself.
    #[error("Resource '{0}' cannot depend on itself")]
    SelfDependency(String),

    /// An availability zone index is outside the configured list.
    #[error("Stack '{stack}' needs availability zone #{index} but only {available} configured")]
    MissingAvailabilityZone {
        /// Stack name
        stack: String,
        /// Requested position
        index: usize,
        /// Number of zones configured
        available: usize,
    },

    // ========================================================================
    // Graph / Validation Errors
    // ========================================================================
    /// The declaration graph contains a cycle.
    #[error("Dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// Structural validation failed.
    #[error("Stack '{stack}' failed validation with {} error(s)", .report.error_count())]
    Validation {
        /// Stack name
        stack: String,
        /// Full report, warnings included
        report: ValidationReport,
    },

    // ========================================================================
    // Application Errors
    // ========================================================================
    /// Two stacks registered under the same name.
    #[error("Stack '{0}' is already registered")]
    DuplicateStack(String),

    /// Requested stack is not registered.
    #[error("Stack '{0}' not found")]
    StackNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // IO / Serialization Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid CIDR error.
    pub fn invalid_cidr(literal: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCidr {
            literal: literal.into(),
            message: message.into(),
        }
    }

    /// Creates a new unknown resource error.
    pub fn unknown_resource(stack: impl Into<String>, id: impl Into<String>) -> Self {
        Self::UnknownResource {
            stack: stack.into(),
            id: id.into(),
        }
    }

    /// Creates a new invalid logical id error.
    pub fn invalid_logical_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLogicalId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new invalid configuration value error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns the validation report carried by this error, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Error::Validation { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation { .. } | Error::DependencyCycle(_) => 2,
            Error::DuplicateLogicalId { .. }
            | Error::InvalidLogicalId { .. }
            | Error::InvalidCidr { .. }
            | Error::UnknownResource { .. }
            | Error::SelfDependency(_)
            | Error::MissingAvailabilityZone { .. } => 3,
            Error::Config(_) | Error::InvalidConfig { .. } => 4,
            Error::StackNotFound(_) | Error::DuplicateStack(_) => 5,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
