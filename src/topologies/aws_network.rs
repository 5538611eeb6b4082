//! The AWS side of the hybrid topologies: a private VPC reaching the
//! on-premises range through a transit gateway.

use crate::cidr::Cidr;
use crate::error::Result;
use crate::resources::{
    Instance, LogicalId, MachineImage, NextHop, Placement, Route, RouteTable, SecurityGroup,
    SecurityGroupIngress, SecurityGroupRule, Subnet, SubnetRouteTableAssociation, TransitGateway,
    TransitGatewayAttachment, Vpc,
};
use crate::stack::Scope;

use super::cidrs::HybridPlan;
use super::common::{instance_identity, session_manager_endpoints, session_manager_policy};

const NAME: &str = "aws-private-network";

/// Logical ids of the declared AWS network.
#[derive(Debug, Clone)]
pub struct AwsNetwork {
    /// VPC
    pub vpc: LogicalId,
    /// Private subnets, one per zone
    pub subnets: [LogicalId; 2],
    /// Route table shared by both subnets
    pub route_table: LogicalId,
    /// Transit gateway
    pub transit_gateway: LogicalId,
    /// Transit gateway VPC attachment
    pub transit_gateway_attachment: LogicalId,
    /// Instance security group
    pub security_group: LogicalId,
    /// Instances, one per subnet
    pub instances: [LogicalId; 2],
}

/// Declare the AWS private network in `scope`.
///
/// Subnets are spread over the first two zones of the stack. All traffic
/// leaves through the transit gateway; SSH is open to the world and the
/// on-premises range is trusted.
pub fn aws_private_network(scope: &mut Scope<'_>, plan: &HybridPlan) -> Result<AwsNetwork> {
    let zones = [scope.availability_zone(0)?, scope.availability_zone(1)?];

    let vpc = scope.add("Vpc", Vpc::new(plan.aws_vpc).with_name(NAME))?;
    let subnet_a = scope.add(
        "PrivateSubnetA",
        Subnet::new(&vpc, plan.aws_private_subnets[0], zones[0].clone()),
    )?;
    let subnet_b = scope.add(
        "PrivateSubnetB",
        Subnet::new(&vpc, plan.aws_private_subnets[1], zones[1].clone()),
    )?;

    let route_table = scope.add(
        "CustomRouteTable",
        RouteTable::new(&vpc).with_name(format!("{}-custom_route_table", NAME)),
    )?;

    let tgw = scope.add(
        "TransitGateway",
        TransitGateway::new()
            .with_description("Transit Gateway for the AWS private network")
            .with_name(format!("{}-transit-gateway", NAME)),
    )?;
    let tgw_attachment = scope.add(
        "TGWAttachment",
        TransitGatewayAttachment::new(&tgw, &vpc, &[&subnet_a, &subnet_b])
            .with_name(format!("{}-transit-gateway-attach", NAME)),
    )?;

    let default_route = scope.add(
        "TGWDefaultRoute",
        Route::default_route(&route_table, NextHop::TransitGateway(tgw.clone())),
    )?;
    scope.add_dependency(&default_route, &tgw_attachment)?;

    scope.add(
        "PrivateSubnetARTAssoc",
        SubnetRouteTableAssociation::new(&subnet_a, &route_table),
    )?;
    scope.add(
        "PrivateSubnetBRTAssoc",
        SubnetRouteTableAssociation::new(&subnet_b, &route_table),
    )?;

    let security_group = scope.add(
        "EC2SecurityGroup",
        SecurityGroup::new(&vpc, "AWS private network default security group")
            .with_group_name("aws-vpc-ec2-sg")
            .with_ingress(SecurityGroupRule::tcp(22, Cidr::any()).with_description("Allow SSH IPv4 IN"))
            .with_ingress(
                SecurityGroupRule::all_traffic(plan.onprem_vpc)
                    .with_description("Allow ALL from ONPREM Networks"),
            ),
    )?;
    scope.add(
        "EC2SecurityGroupSelfReferenceRule",
        SecurityGroupIngress::self_reference(&security_group),
    )?;

    session_manager_endpoints(scope, &vpc, &[&subnet_a, &subnet_b], &security_group)?;

    let identity = instance_identity(
        scope,
        &format!("{}-ec2-iam-role", NAME),
        session_manager_policy(),
    )?;

    let server = |subnet: &LogicalId, suffix: &str| {
        Instance::new(
            "t2.micro",
            MachineImage::latest_amazon_linux(),
            Placement::Subnet(subnet.clone()),
        )
        .with_security_group(&security_group)
        .with_instance_profile(&identity.profile)
        .with_name(format!("{}-ec2-{}", NAME, suffix))
    };
    let instance_a = scope.add("EC2A", server(&subnet_a, "a"))?;
    let instance_b = scope.add("EC2B", server(&subnet_b, "b"))?;

    Ok(AwsNetwork {
        vpc,
        subnets: [subnet_a, subnet_b],
        route_table,
        transit_gateway: tgw,
        transit_gateway_attachment: tgw_attachment,
        security_group,
        instances: [instance_a, instance_b],
    })
}
