//! VPC endpoints for AWS services.

use serde_json::{json, Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind};

/// Endpoint flavour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointType {
    /// Interface endpoint: ENIs in subnets, guarded by security groups
    Interface {
        /// Subnets receiving endpoint interfaces
        subnets: Vec<LogicalId>,
        /// Security groups on the interfaces
        security_groups: Vec<LogicalId>,
        /// Resolve the public service name to the endpoint
        private_dns: bool,
    },
    /// Gateway endpoint: prefix-list routes added to route tables
    Gateway {
        /// Route tables receiving the routes
        route_tables: Vec<LogicalId>,
    },
}

/// A VPC endpoint.
///
/// The service name is built from the deploying region at synthesis time,
/// so the same declaration works in any region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcEndpoint {
    /// Network
    pub vpc: LogicalId,
    /// Short service name, e.g. `ssm` or `s3`
    pub service: String,
    /// Interface or gateway
    pub endpoint_type: EndpointType,
}

impl VpcEndpoint {
    /// An interface endpoint with private DNS enabled.
    pub fn interface(
        vpc: &LogicalId,
        service: impl Into<String>,
        subnets: &[&LogicalId],
        security_groups: &[&LogicalId],
    ) -> Self {
        Self {
            vpc: vpc.clone(),
            service: service.into(),
            endpoint_type: EndpointType::Interface {
                subnets: subnets.iter().map(|s| (*s).clone()).collect(),
                security_groups: security_groups.iter().map(|s| (*s).clone()).collect(),
                private_dns: true,
            },
        }
    }

    /// A gateway endpoint.
    pub fn gateway(vpc: &LogicalId, service: impl Into<String>, route_tables: &[&LogicalId]) -> Self {
        Self {
            vpc: vpc.clone(),
            service: service.into(),
            endpoint_type: EndpointType::Gateway {
                route_tables: route_tables.iter().map(|r| (*r).clone()).collect(),
            },
        }
    }

    /// `com.amazonaws.<region>.<service>` as a template expression.
    pub fn service_name(&self) -> Value {
        json!({
            "Fn::Join": ["", ["com.amazonaws.", { "Ref": "AWS::Region" }, format!(".{}", self.service)]]
        })
    }
}

impl Declaration for VpcEndpoint {
    const KIND: ResourceKind = ResourceKind::VpcEndpoint;

    fn properties(&self) -> Map<String, Value> {
        let props = match &self.endpoint_type {
            EndpointType::Interface {
                subnets,
                security_groups,
                private_dns,
            } => Properties::new()
                .set("PrivateDnsEnabled", *private_dns)
                .set(
                    "SecurityGroupIds",
                    security_groups.iter().map(|g| g.get_att("GroupId")).collect::<Vec<_>>(),
                )
                .set("ServiceName", self.service_name())
                .set("SubnetIds", subnets.iter().map(LogicalId::reference).collect::<Vec<_>>())
                .set("VpcEndpointType", "Interface"),
            EndpointType::Gateway { route_tables } => Properties::new()
                .set(
                    "RouteTableIds",
                    route_tables.iter().map(LogicalId::reference).collect::<Vec<_>>(),
                )
                .set("ServiceName", self.service_name())
                .set("VpcEndpointType", "Gateway"),
        };
        props.set("VpcId", self.vpc.reference()).build()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        match &self.endpoint_type {
            EndpointType::Interface {
                subnets,
                security_groups,
                ..
            } => {
                refs.extend(
                    security_groups
                        .iter()
                        .map(|g| Reference::new("SecurityGroupIds", g, &[ResourceKind::SecurityGroup])),
                );
                refs.extend(
                    subnets
                        .iter()
                        .map(|s| Reference::new("SubnetIds", s, &[ResourceKind::Subnet])),
                );
            }
            EndpointType::Gateway { route_tables } => {
                refs.extend(
                    route_tables
                        .iter()
                        .map(|r| Reference::new("RouteTableIds", r, &[ResourceKind::RouteTable])),
                );
            }
        }
        refs.push(Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc]));
        refs
    }
}
