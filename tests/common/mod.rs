//! Shared fixtures for the vpc-topologies integration tests.
//!
//! Include this module in your integration tests:
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use vpc_topologies::cidr::Cidr;
use vpc_topologies::resources::{
    LogicalId, RouteTable, Subnet, SubnetRouteTableAssociation, Vpc,
};
use vpc_topologies::stack::Stack;
use vpc_topologies::topologies::{StackSettings, Topology};

/// Parse a CIDR literal known to be valid.
pub fn cidr(literal: &str) -> Cidr {
    Cidr::parse(literal).unwrap()
}

/// A logical id known to be valid.
pub fn id(s: &str) -> LogicalId {
    LogicalId::new(s).unwrap()
}

/// An empty stack with two zones.
pub fn empty_stack() -> Stack {
    Stack::new("test", "us-east-1").with_availability_zones(["us-east-1a", "us-east-1b"])
}

/// Default settings for `topology` in us-east-1.
pub fn settings(topology: Topology) -> StackSettings {
    StackSettings::new(topology, "us-east-1")
}

/// Build `topology` with default settings.
pub fn build(topology: Topology) -> Stack {
    topology.build(&settings(topology)).unwrap()
}

/// Ids of a minimal network: one VPC, one route table.
pub struct Network {
    pub vpc: LogicalId,
    pub route_table: LogicalId,
}

/// Declare `Vpc` and `RouteTable` with the given range.
pub fn network(stack: &mut Stack, range: &str) -> Network {
    let vpc = stack.add("Vpc", Vpc::new(cidr(range))).unwrap();
    let route_table = stack.add("RouteTable", RouteTable::new(&vpc)).unwrap();
    Network { vpc, route_table }
}

/// Declare a subnet associated with the network's route table.
pub fn associated_subnet(
    stack: &mut Stack,
    net: &Network,
    name: &str,
    range: &str,
    zone: &str,
) -> LogicalId {
    let subnet = stack.add(name, Subnet::new(&net.vpc, cidr(range), zone)).unwrap();
    stack
        .add(
            &format!("{}Assoc", name),
            SubnetRouteTableAssociation::new(&subnet, &net.route_table),
        )
        .unwrap();
    subnet
}
