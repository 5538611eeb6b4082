//! # vpc-topologies
//!
//! Typed declarations of three demo VPC topologies, checked as a dependency
//! graph and synthesized into CloudFormation templates.
//!
//! ## Core Concepts
//!
//! - **Resources**: typed declarations (VPCs, subnets, routes, gateways,
//!   security groups, instances, IAM roles) that know their template type,
//!   properties and the logical ids they reference
//! - **Stacks**: named, region-bound collections of resources plus explicit
//!   ordering edges and outputs
//! - **Scopes**: prefixed views of a stack so one builder can be reused
//! - **Graph**: reference and explicit edges between declarations, used for
//!   cycle detection and a deterministic provisioning order
//! - **Validation**: structural rules run before any template is written
//! - **Topologies**: the hybrid, site-to-site VPN and private access stacks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CLI Interface                         │
//! │              (list / synth / validate / graph)               │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Config  ──►  Topologies  ──►  App                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!          ┌────────────────────┼────────────────────┐
//!          ▼                    ▼                    ▼
//! ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐
//! │      Stack      │  │   Declaration   │  │   Validation    │
//! │  (resources +   │  │      Graph      │  │     Report      │
//! │   DependsOn)    │  │   (petgraph)    │  │                 │
//! └─────────────────┘  └─────────────────┘  └─────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │               CloudFormation templates + manifest            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use vpc_topologies::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let settings = StackSettings::new(Topology::PrivateAccess, "us-east-1");
//!     let stack = Topology::PrivateAccess.build(&settings)?;
//!
//!     let template = stack.synthesize()?;
//!     println!("{}", template.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cidr;
pub mod config;
pub mod error;
pub mod graph;
pub mod resources;
pub mod stack;
pub mod template;
pub mod topologies;
pub mod validate;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::{App, Manifest};
    pub use crate::cidr::Cidr;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::graph::DeclarationGraph;
    pub use crate::resources::{Declaration, LogicalId, Resource, ResourceKind};
    pub use crate::stack::{OutputValue, Scope, Stack};
    pub use crate::template::Template;
    pub use crate::topologies::{StackSettings, Topology};
    pub use crate::validate::{Severity, ValidationReport, Violation};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
