//! Route tables and routes.

use serde_json::{Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind, Tag};
use crate::cidr::Cidr;

/// A route table owned by one network.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    /// Owning network
    pub vpc: LogicalId,
    /// Tags
    pub tags: Vec<Tag>,
}

impl RouteTable {
    /// Create a new route table.
    pub fn new(vpc: &LogicalId) -> Self {
        Self {
            vpc: vpc.clone(),
            tags: Vec::new(),
        }
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for RouteTable {
    const KIND: ResourceKind = ResourceKind::RouteTable;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("VpcId", self.vpc.reference())
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc])]
    }
}

/// Where a route sends matching traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHop {
    /// An internet gateway, usable only once attached to the VPC
    InternetGateway(LogicalId),
    /// A NAT gateway
    NatGateway(LogicalId),
    /// A transit gateway, usable only once attached to the VPC
    TransitGateway(LogicalId),
    /// A network interface, typically a router appliance
    NetworkInterface(LogicalId),
}

impl NextHop {
    /// Logical id of the target.
    pub fn target(&self) -> &LogicalId {
        match self {
            NextHop::InternetGateway(id)
            | NextHop::NatGateway(id)
            | NextHop::TransitGateway(id)
            | NextHop::NetworkInterface(id) => id,
        }
    }

    /// Whether the gateway must be attached before the route is created.
    pub fn requires_attachment(&self) -> bool {
        matches!(self, NextHop::InternetGateway(_) | NextHop::TransitGateway(_))
    }

    fn property(&self) -> &'static str {
        match self {
            NextHop::InternetGateway(_) => "GatewayId",
            NextHop::NatGateway(_) => "NatGatewayId",
            NextHop::TransitGateway(_) => "TransitGatewayId",
            NextHop::NetworkInterface(_) => "NetworkInterfaceId",
        }
    }

    fn kind(&self) -> &'static [ResourceKind] {
        match self {
            NextHop::InternetGateway(_) => &[ResourceKind::InternetGateway],
            NextHop::NatGateway(_) => &[ResourceKind::NatGateway],
            NextHop::TransitGateway(_) => &[ResourceKind::TransitGateway],
            NextHop::NetworkInterface(_) => &[ResourceKind::NetworkInterface],
        }
    }

    fn value(&self) -> Value {
        match self {
            NextHop::TransitGateway(id) | NextHop::NetworkInterface(id) => id.get_att("Id"),
            NextHop::InternetGateway(id) | NextHop::NatGateway(id) => id.reference(),
        }
    }
}

/// A single route: destination CIDR to one next hop.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Route table holding the route
    pub route_table: LogicalId,
    /// Destination block
    pub destination: Cidr,
    /// Next hop
    pub next_hop: NextHop,
}

impl Route {
    /// Create a new route.
    pub fn new(route_table: &LogicalId, destination: Cidr, next_hop: NextHop) -> Self {
        Self {
            route_table: route_table.clone(),
            destination,
            next_hop,
        }
    }

    /// A `0.0.0.0/0` route.
    pub fn default_route(route_table: &LogicalId, next_hop: NextHop) -> Self {
        Self::new(route_table, Cidr::any(), next_hop)
    }
}

impl Declaration for Route {
    const KIND: ResourceKind = ResourceKind::Route;

    fn properties(&self) -> Map<String, Value> {
        Properties::new()
            .set("DestinationCidrBlock", self.destination.to_string())
            .set("RouteTableId", self.route_table.reference())
            .set(self.next_hop.property(), self.next_hop.value())
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("RouteTableId", &self.route_table, &[ResourceKind::RouteTable]),
            Reference::new(
                self.next_hop.property(),
                self.next_hop.target(),
                self.next_hop.kind(),
            ),
        ]
    }
}
