//! Address plans of the demo topologies.
//!
//! Ranges are kept as literals so they can be overridden from configuration
//! files; they are parsed (and rejected if malformed) when a stack is built.

use serde::{Deserialize, Serialize};

use crate::cidr::Cidr;
use crate::error::Result;

/// Address plan shared by the hybrid and site-to-site VPN topologies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridCidrs {
    /// AWS side network
    pub aws_vpc: String,
    /// First AWS private subnet
    pub aws_private_subnet_a: String,
    /// Second AWS private subnet
    pub aws_private_subnet_b: String,
    /// Simulated on-premises network
    pub onprem_vpc: String,
    /// On-premises public subnet holding the router uplinks
    pub onprem_public_subnet: String,
    /// First on-premises private subnet
    pub onprem_private_subnet_a: String,
    /// Second on-premises private subnet
    pub onprem_private_subnet_b: String,
}

impl Default for HybridCidrs {
    fn default() -> Self {
        Self {
            aws_vpc: "10.16.0.0/16".to_string(),
            aws_private_subnet_a: "10.16.32.0/20".to_string(),
            aws_private_subnet_b: "10.16.96.0/20".to_string(),
            onprem_vpc: "192.168.8.0/21".to_string(),
            onprem_public_subnet: "192.168.12.0/24".to_string(),
            onprem_private_subnet_a: "192.168.10.0/24".to_string(),
            onprem_private_subnet_b: "192.168.11.0/24".to_string(),
        }
    }
}

/// Parsed [`HybridCidrs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridPlan {
    /// AWS side network
    pub aws_vpc: Cidr,
    /// AWS private subnets
    pub aws_private_subnets: [Cidr; 2],
    /// On-premises network
    pub onprem_vpc: Cidr,
    /// On-premises public subnet
    pub onprem_public_subnet: Cidr,
    /// On-premises private subnets
    pub onprem_private_subnets: [Cidr; 2],
}

impl HybridCidrs {
    /// Parse every range.
    pub fn parse(&self) -> Result<HybridPlan> {
        Ok(HybridPlan {
            aws_vpc: Cidr::parse(&self.aws_vpc)?,
            aws_private_subnets: [
                Cidr::parse(&self.aws_private_subnet_a)?,
                Cidr::parse(&self.aws_private_subnet_b)?,
            ],
            onprem_vpc: Cidr::parse(&self.onprem_vpc)?,
            onprem_public_subnet: Cidr::parse(&self.onprem_public_subnet)?,
            onprem_private_subnets: [
                Cidr::parse(&self.onprem_private_subnet_a)?,
                Cidr::parse(&self.onprem_private_subnet_b)?,
            ],
        })
    }
}

/// Address plan of the private access topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateAccessCidrs {
    /// Network
    pub vpc: String,
    /// Public subnet hosting the NAT gateway
    pub public_subnet: String,
    /// Private subnet routed through the NAT gateway
    pub private_subnet: String,
}

impl Default for PrivateAccessCidrs {
    fn default() -> Self {
        Self {
            vpc: "10.16.0.0/16".to_string(),
            public_subnet: "10.16.96.0/20".to_string(),
            private_subnet: "10.16.32.0/20".to_string(),
        }
    }
}

/// Parsed [`PrivateAccessCidrs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivateAccessPlan {
    /// Network
    pub vpc: Cidr,
    /// Public subnet
    pub public_subnet: Cidr,
    /// Private subnet
    pub private_subnet: Cidr,
}

impl PrivateAccessCidrs {
    /// Parse every range.
    pub fn parse(&self) -> Result<PrivateAccessPlan> {
        Ok(PrivateAccessPlan {
            vpc: Cidr::parse(&self.vpc)?,
            public_subnet: Cidr::parse(&self.public_subnet)?,
            private_subnet: Cidr::parse(&self.private_subnet)?,
        })
    }
}
