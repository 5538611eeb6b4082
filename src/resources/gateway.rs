//! Gateways, their attachments and elastic IPs.

use std::net::Ipv4Addr;

use serde_json::{Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind, Tag};

fn enable(flag: bool) -> &'static str {
    if flag {
        "enable"
    } else {
        "disable"
    }
}

/// An internet gateway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InternetGateway {
    /// Tags
    pub tags: Vec<Tag>,
}

impl InternetGateway {
    /// Create a new internet gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for InternetGateway {
    const KIND: ResourceKind = ResourceKind::InternetGateway;

    fn properties(&self) -> Map<String, Value> {
        Properties::new().tags(&self.tags).build()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// Attaches an internet gateway to a network.
#[derive(Debug, Clone, PartialEq)]
pub struct VpcGatewayAttachment {
    /// Network
    pub vpc: LogicalId,
    /// Attached gateway
    pub internet_gateway: LogicalId,
}

impl VpcGatewayAttachment {
    /// Create a new attachment.
    pub fn new(vpc: &LogicalId, internet_gateway: &LogicalId) -> Self {
        Self {
            vpc: vpc.clone(),
            internet_gateway: internet_gateway.clone(),
        }
    }
}

impl Declaration for VpcGatewayAttachment {
    const KIND: ResourceKind = ResourceKind::VpcGatewayAttachment;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("InternetGatewayId", self.internet_gateway.reference())
            .set("VpcId", self.vpc.reference())
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new(
                "InternetGatewayId",
                &self.internet_gateway,
                &[ResourceKind::InternetGateway],
            ),
            Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc]),
        ]
    }
}

/// A VPC-scoped elastic IP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElasticIp {
    /// Tags
    pub tags: Vec<Tag>,
}

impl ElasticIp {
    /// Create a new elastic IP.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for ElasticIp {
    const KIND: ResourceKind = ResourceKind::ElasticIp;

    fn properties(&self) -> Map<String, Value> {
        Properties::new().set("Domain", "vpc").tags(&self.tags).build()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// Binds an elastic IP to a network interface.
#[derive(Debug, Clone, PartialEq)]
pub struct EipAssociation {
    /// Elastic IP
    pub elastic_ip: LogicalId,
    /// Interface receiving the address
    pub network_interface: LogicalId,
}

impl EipAssociation {
    /// Create a new association.
    pub fn new(elastic_ip: &LogicalId, network_interface: &LogicalId) -> Self {
        Self {
            elastic_ip: elastic_ip.clone(),
            network_interface: network_interface.clone(),
        }
    }
}

impl Declaration for EipAssociation {
    const KIND: ResourceKind = ResourceKind::EipAssociation;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("AllocationId", self.elastic_ip.get_att("AllocationId"))
            .set("NetworkInterfaceId", self.network_interface.get_att("Id"))
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("AllocationId", &self.elastic_ip, &[ResourceKind::ElasticIp]),
            Reference::new(
                "NetworkInterfaceId",
                &self.network_interface,
                &[ResourceKind::NetworkInterface],
            ),
        ]
    }
}

/// A public NAT gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct NatGateway {
    /// Elastic IP providing the public address
    pub elastic_ip: LogicalId,
    /// Public subnet hosting the gateway
    pub subnet: LogicalId,
    /// Tags
    pub tags: Vec<Tag>,
}

impl NatGateway {
    /// Create a new NAT gateway.
    pub fn new(elastic_ip: &LogicalId, subnet: &LogicalId) -> Self {
        Self {
            elastic_ip: elastic_ip.clone(),
            subnet: subnet.clone(),
            tags: Vec::new(),
        }
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for NatGateway {
    const KIND: ResourceKind = ResourceKind::NatGateway;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("AllocationId", self.elastic_ip.get_att("AllocationId"))
            .set("SubnetId", self.subnet.reference())
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("AllocationId", &self.elastic_ip, &[ResourceKind::ElasticIp]),
            Reference::new("SubnetId", &self.subnet, &[ResourceKind::Subnet]),
        ]
    }
}

/// A transit gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitGateway {
    /// Free-form description
    pub description: Option<String>,
    /// ASN on the Amazon side of BGP sessions
    pub amazon_side_asn: u32,
    /// Associate attachments with the default route table
    pub default_route_table_association: bool,
    /// DNS support
    pub dns_support: bool,
    /// Equal-cost multipath over VPN
    pub vpn_ecmp_support: bool,
    /// Tags
    pub tags: Vec<Tag>,
}

impl Default for TransitGateway {
    fn default() -> Self {
        Self {
            description: None,
            amazon_side_asn: 64512,
            default_route_table_association: true,
            dns_support: true,
            vpn_ecmp_support: true,
            tags: Vec::new(),
        }
    }
}

impl TransitGateway {
    /// A transit gateway with the default private ASN.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for TransitGateway {
    const KIND: ResourceKind = ResourceKind::TransitGateway;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("AmazonSideAsn", self.amazon_side_asn)
            .set(
                "DefaultRouteTableAssociation",
                enable(self.default_route_table_association),
            )
            .set_opt("Description", self.description.as_deref())
            .set("DnsSupport", enable(self.dns_support))
            .set("VpnEcmpSupport", enable(self.vpn_ecmp_support))
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// Attaches a transit gateway to a network through one subnet per zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitGatewayAttachment {
    /// Transit gateway
    pub transit_gateway: LogicalId,
    /// Network
    pub vpc: LogicalId,
    /// Subnets hosting the attachment interfaces
    pub subnets: Vec<LogicalId>,
    /// Tags
    pub tags: Vec<Tag>,
}

impl TransitGatewayAttachment {
    /// Create a new attachment.
    pub fn new(transit_gateway: &LogicalId, vpc: &LogicalId, subnets: &[&LogicalId]) -> Self {
        Self {
            transit_gateway: transit_gateway.clone(),
            vpc: vpc.clone(),
            subnets: subnets.iter().map(|s| (*s).clone()).collect(),
            tags: Vec::new(),
        }
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for TransitGatewayAttachment {
    const KIND: ResourceKind = ResourceKind::TransitGatewayAttachment;

    fn properties(&self) -> Map<String, Value> {
        let subnets: Vec<Value> = self.subnets.iter().map(LogicalId::reference).collect();
        Properties::new()
            .set("SubnetIds", subnets)
            .set("TransitGatewayId", self.transit_gateway.get_att("Id"))
            .set("VpcId", self.vpc.reference())
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .subnets
            .iter()
            .map(|s| Reference::new("SubnetIds", s, &[ResourceKind::Subnet]))
            .collect();
        refs.push(Reference::new(
            "TransitGatewayId",
            &self.transit_gateway,
            &[ResourceKind::TransitGateway],
        ));
        refs.push(Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc]));
        refs
    }
}

/// Where a customer gateway gets its public address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpAddressSource {
    /// A fixed address
    Literal(Ipv4Addr),
    /// The public IP of a declared instance, known only after provisioning
    InstancePublicIp(LogicalId),
}

/// The on-premises end of a site-to-site VPN.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerGateway {
    /// BGP ASN of the customer side
    pub bgp_asn: u32,
    /// Public address of the device
    pub ip_address: IpAddressSource,
    /// Device name
    pub device_name: Option<String>,
    /// Tags
    pub tags: Vec<Tag>,
}

impl CustomerGateway {
    /// Create a new `ipsec.1` customer gateway.
    pub fn new(bgp_asn: u32, ip_address: IpAddressSource) -> Self {
        Self {
            bgp_asn,
            ip_address,
            device_name: None,
            tags: Vec::new(),
        }
    }

    /// Set the device name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }

    /// The instance whose public IP this gateway uses, if any.
    pub fn source_instance(&self) -> Option<&LogicalId> {
        match &self.ip_address {
            IpAddressSource::InstancePublicIp(id) => Some(id),
            IpAddressSource::Literal(_) => None,
        }
    }
}

impl Declaration for CustomerGateway {
    const KIND: ResourceKind = ResourceKind::CustomerGateway;

    fn properties(&self) -> Map<String, Value> {
        let ip = match &self.ip_address {
            IpAddressSource::Literal(addr) => Value::from(addr.to_string()),
            IpAddressSource::InstancePublicIp(id) => id.get_att("PublicIp"),
        };
        Properties::new()
            .set("BgpAsn", self.bgp_asn)
            .set_opt("DeviceName", self.device_name.as_deref())
            .set("IpAddress", ip)
            .set("Type", "ipsec.1")
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        self.source_instance()
            .map(|id| vec![Reference::new("IpAddress", id, &[ResourceKind::Instance])])
            .unwrap_or_default()
    }
}
