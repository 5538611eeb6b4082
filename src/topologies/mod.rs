//! The demo topologies.
//!
//! Each topology is a function from [`StackSettings`] to a fully declared
//! [`Stack`]. Nothing is validated here; callers synthesize the stack, which
//! validates it first.

pub mod aws_network;
pub mod cidrs;
pub mod common;
pub mod hybrid;
pub mod onprem;
pub mod private_access;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stack::Stack;

pub use aws_network::{aws_private_network, AwsNetwork};
pub use cidrs::{HybridCidrs, HybridPlan, PrivateAccessCidrs, PrivateAccessPlan};
pub use hybrid::{hybrid_stack, site_to_site_vpn_stack};
pub use onprem::{onprem_network, OnPremNetwork, Router};
pub use private_access::{private_access_stack, PrivateAccessOptions};

/// Region used when nothing else is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A buildable topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// AWS private network plus the simulated on-premises network
    Hybrid,
    /// Hybrid plus customer gateways for each router
    SiteToSiteVpn,
    /// NAT gateway pattern
    PrivateAccess,
}

impl Topology {
    /// Every topology, in registration order.
    pub const ALL: [Topology; 3] = [
        Topology::Hybrid,
        Topology::SiteToSiteVpn,
        Topology::PrivateAccess,
    ];

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            Topology::Hybrid => "hybrid",
            Topology::SiteToSiteVpn => "site-to-site-vpn",
            Topology::PrivateAccess => "private-access",
        }
    }

    /// Stack name used unless configured otherwise.
    pub fn default_stack_name(&self) -> &'static str {
        match self {
            Topology::Hybrid => "hybrid-architecture-demo",
            Topology::SiteToSiteVpn => "site-to-site-vpn-demo",
            Topology::PrivateAccess => "private-access-demo",
        }
    }

    /// Declare the topology.
    pub fn build(&self, settings: &StackSettings) -> Result<Stack> {
        match self {
            Topology::Hybrid => hybrid_stack(settings),
            Topology::SiteToSiteVpn => site_to_site_vpn_stack(settings),
            Topology::PrivateAccess => private_access_stack(settings),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything a topology needs to declare its stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSettings {
    /// Stack name
    pub stack_name: String,
    /// Target region
    pub region: String,
    /// Zones, consumed positionally
    pub availability_zones: Vec<String>,
    /// Address plan of the hybrid topologies
    pub hybrid_cidrs: HybridCidrs,
    /// Address plan of the private access topology
    pub private_access_cidrs: PrivateAccessCidrs,
    /// Private access options
    pub private_access: PrivateAccessOptions,
}

impl StackSettings {
    /// Defaults for `topology` in `region`: the default stack name and the
    /// region's `a`, `b` and `c` zones.
    pub fn new(topology: Topology, region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            stack_name: topology.default_stack_name().to_string(),
            availability_zones: default_availability_zones(&region),
            region,
            hybrid_cidrs: HybridCidrs::default(),
            private_access_cidrs: PrivateAccessCidrs::default(),
            private_access: PrivateAccessOptions::default(),
        }
    }

    /// An empty stack carrying these settings.
    pub fn empty_stack(&self, description: &str) -> Stack {
        Stack::new(&self.stack_name, &self.region)
            .with_availability_zones(self.availability_zones.iter().cloned())
            .with_description(description)
    }
}

/// `<region>a`, `<region>b`, `<region>c`.
pub fn default_availability_zones(region: &str) -> Vec<String> {
    ["a", "b", "c"]
        .iter()
        .map(|suffix| format!("{}{}", region, suffix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_topology_names() {
        let names: Vec<String> = Topology::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["hybrid", "site-to-site-vpn", "private-access"]);
        assert_eq!(
            serde_json::to_value(Topology::SiteToSiteVpn).unwrap(),
            serde_json::json!("site-to-site-vpn")
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = StackSettings::new(Topology::SiteToSiteVpn, "eu-west-1");
        assert_eq!(settings.stack_name, "site-to-site-vpn-demo");
        assert_eq!(
            settings.availability_zones,
            vec!["eu-west-1a", "eu-west-1b", "eu-west-1c"]
        );
    }

    #[test]
    fn test_private_access_needs_one_zone() {
        let mut settings = StackSettings::new(Topology::PrivateAccess, "us-east-1");
        settings.availability_zones.clear();
        assert!(matches!(
            Topology::PrivateAccess.build(&settings),
            Err(Error::MissingAvailabilityZone { index: 0, .. })
        ));
    }

    #[test]
    fn test_hybrid_needs_two_zones() {
        let mut settings = StackSettings::new(Topology::Hybrid, "us-east-1");
        settings.availability_zones.truncate(1);
        assert!(matches!(
            Topology::Hybrid.build(&settings),
            Err(Error::MissingAvailabilityZone { index: 1, .. })
        ));
    }

    #[test]
    fn test_hybrid_ids_are_prefixed() {
        let stack = Topology::Hybrid
            .build(&StackSettings::new(Topology::Hybrid, DEFAULT_REGION))
            .unwrap();
        assert!(stack.contains("AWSVpc"));
        assert!(stack.contains("OnPremVpc"));
        assert!(stack.contains("AWSTGWDefaultRoute"));
        assert!(stack.contains("OnPremRouterA"));
        assert!(!stack.contains("OnPremRouterACGW"));
    }
}
