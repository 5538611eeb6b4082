//! Networks, subnets and route table associations.

use serde_json::{Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind, Tag};
use crate::cidr::Cidr;

/// A VPC.
#[derive(Debug, Clone, PartialEq)]
pub struct Vpc {
    /// Address range of the network
    pub cidr: Cidr,
    /// Enable the Amazon-provided DNS server
    pub enable_dns_support: bool,
    /// Give instances public DNS hostnames
    pub enable_dns_hostnames: bool,
    /// Tags
    pub tags: Vec<Tag>,
}

impl Vpc {
    /// A network with DNS support and hostnames enabled.
    pub fn new(cidr: Cidr) -> Self {
        Self {
            cidr,
            enable_dns_support: true,
            enable_dns_hostnames: true,
            tags: Vec::new(),
        }
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for Vpc {
    const KIND: ResourceKind = ResourceKind::Vpc;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("CidrBlock", self.cidr.to_string())
            .set("EnableDnsHostnames", self.enable_dns_hostnames)
            .set("EnableDnsSupport", self.enable_dns_support)
            .set("InstanceTenancy", "default")
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A subnet pinned to one availability zone.
///
/// Subnets never get an implicit route table; every subnet needs exactly one
/// [`SubnetRouteTableAssociation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    /// Parent network
    pub vpc: LogicalId,
    /// Address range, inside the parent's
    pub cidr: Cidr,
    /// Zone the subnet lives in
    pub availability_zone: String,
    /// Auto-assign public IPs to instances
    pub map_public_ip_on_launch: bool,
    /// Tags
    pub tags: Vec<Tag>,
}

impl Subnet {
    /// A subnet that does not map public IPs on launch.
    pub fn new(vpc: &LogicalId, cidr: Cidr, availability_zone: impl Into<String>) -> Self {
        Self {
            vpc: vpc.clone(),
            cidr,
            availability_zone: availability_zone.into(),
            map_public_ip_on_launch: false,
            tags: Vec::new(),
        }
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for Subnet {
    const KIND: ResourceKind = ResourceKind::Subnet;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("AvailabilityZone", self.availability_zone.as_str())
            .set("CidrBlock", self.cidr.to_string())
            .set("MapPublicIpOnLaunch", self.map_public_ip_on_launch)
            .set("VpcId", self.vpc.reference())
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc])]
    }
}

/// Binds a subnet to a route table.
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetRouteTableAssociation {
    /// Associated subnet
    pub subnet: LogicalId,
    /// Route table the subnet uses
    pub route_table: LogicalId,
}

impl SubnetRouteTableAssociation {
    /// Create a new association.
    pub fn new(subnet: &LogicalId, route_table: &LogicalId) -> Self {
        Self {
            subnet: subnet.clone(),
            route_table: route_table.clone(),
        }
    }
}

impl Declaration for SubnetRouteTableAssociation {
    const KIND: ResourceKind = ResourceKind::SubnetRouteTableAssociation;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("RouteTableId", self.route_table.reference())
            .set("SubnetId", self.subnet.reference())
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("RouteTableId", &self.route_table, &[ResourceKind::RouteTable]),
            Reference::new("SubnetId", &self.subnet, &[ResourceKind::Subnet]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_vpc_properties() {
        let vpc = Vpc::new(Cidr::parse("10.16.0.0/16").unwrap()).with_name("aws-private-network");
        let props = vpc.properties();
        assert_eq!(props["CidrBlock"], json!("10.16.0.0/16"));
        assert_eq!(props["EnableDnsSupport"], json!(true));
        assert_eq!(
            props["Tags"],
            json!([{ "Key": "Name", "Value": "aws-private-network" }])
        );
    }

    #[test]
    fn test_subnet_refers_to_vpc() {
        let subnet = Subnet::new(&id("Vpc"), Cidr::parse("10.16.32.0/20").unwrap(), "us-east-1a");
        assert_eq!(subnet.properties()["VpcId"], json!({ "Ref": "Vpc" }));
        assert_eq!(subnet.properties()["MapPublicIpOnLaunch"], json!(false));
        let refs = subnet.references();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].accepts(ResourceKind::Vpc));
        assert!(!refs[0].accepts(ResourceKind::Subnet));
    }

    #[test]
    fn test_association_references() {
        let assoc = SubnetRouteTableAssociation::new(&id("SubnetA"), &id("Rt"));
        let targets: Vec<_> = assoc.references().into_iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![id("Rt"), id("SubnetA")]);
    }
}
