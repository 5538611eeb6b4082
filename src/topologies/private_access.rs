//! A single VPC where a private instance reaches the internet through a NAT
//! gateway in the public subnet.

use serde::{Deserialize, Serialize};

use crate::cidr::Cidr;
use crate::error::Result;
use crate::resources::{
    ElasticIp, Instance, InternetGateway, MachineImage, NatGateway, NextHop, Placement, Route,
    RouteTable, SecurityGroup, SecurityGroupRule, Subnet, SubnetRouteTableAssociation,
    VpcGatewayAttachment, Vpc,
};
use crate::stack::Stack;

use super::common::{administrator_policy, instance_identity, session_manager_policy};
use super::StackSettings;

const NAME: &str = "private_access_demo";

/// Knobs of the demo's intentionally loose settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateAccessOptions {
    /// Grant the instance role every action on every resource.
    /// When off, the role only gets Session Manager access.
    pub permissive_role: bool,
    /// Range allowed to SSH into the instance; `None` or an empty string
    /// declares no SSH rule
    pub ssh_ingress: Option<String>,
}

impl Default for PrivateAccessOptions {
    fn default() -> Self {
        Self {
            permissive_role: true,
            ssh_ingress: Some("0.0.0.0/0".to_string()),
        }
    }
}

/// The NAT gateway pattern.
pub fn private_access_stack(settings: &StackSettings) -> Result<Stack> {
    let plan = settings.private_access_cidrs.parse()?;
    let options = &settings.private_access;
    let ssh_ingress = options
        .ssh_ingress
        .as_deref()
        .filter(|cidr| !cidr.is_empty())
        .map(Cidr::parse)
        .transpose()?;

    let mut stack =
        settings.empty_stack("Private access: private instance reaching out through a NAT gateway");
    let zone = stack.availability_zone(0)?.to_string();

    let vpc = stack.add("Vpc", Vpc::new(plan.vpc).with_name(format!("{}_vpc", NAME)))?;
    let public_subnet = stack.add("PublicSubnet", Subnet::new(&vpc, plan.public_subnet, zone.clone()))?;
    let private_subnet = stack.add("PrivateSubnet", Subnet::new(&vpc, plan.private_subnet, zone))?;

    let igw = stack.add("IGW", InternetGateway::new().with_name(format!("{}_igw", NAME)))?;
    let igw_attachment = stack.add("IGWAttach", VpcGatewayAttachment::new(&vpc, &igw))?;

    let eip = stack.add("EIP", ElasticIp::new().with_name(format!("{}_eip", NAME)))?;
    let nat = stack.add(
        "NatGateway",
        NatGateway::new(&eip, &public_subnet).with_name(format!("{}_ngw", NAME)),
    )?;

    let private_table = stack.add(
        "PrivateSubnetRouteTable",
        RouteTable::new(&vpc).with_name(format!("{}_private_subnet_route_table", NAME)),
    )?;
    stack.add(
        "PrivateSubnetRouteTableRoute",
        Route::default_route(&private_table, NextHop::NatGateway(nat)),
    )?;
    stack.add(
        "PrivateSubnetRTAssoc",
        SubnetRouteTableAssociation::new(&private_subnet, &private_table),
    )?;

    let public_table = stack.add(
        "PublicSubnetRouteTable",
        RouteTable::new(&vpc).with_name(format!("{}_public_subnet_route_table", NAME)),
    )?;
    let public_route = stack.add(
        "PublicSubnetRouteTableRoute",
        Route::default_route(&public_table, NextHop::InternetGateway(igw)),
    )?;
    stack.add_dependency(&public_route, &igw_attachment)?;
    stack.add(
        "PublicSubnetRTAssoc",
        SubnetRouteTableAssociation::new(&public_subnet, &public_table),
    )?;

    let policy = if options.permissive_role {
        administrator_policy()
    } else {
        session_manager_policy()
    };
    let identity = instance_identity(
        &mut stack.scope(""),
        "private-access-demo-ec2-iam-role",
        policy,
    )?;

    let mut security_group = SecurityGroup::new(&vpc, "private access demo security group")
        .with_group_name("private-access-demo-ec2-sg");
    if let Some(cidr) = ssh_ingress {
        security_group = security_group.with_ingress(SecurityGroupRule::tcp(22, cidr));
    }
    let security_group = stack.add("EC2SecurityGroup", security_group)?;

    stack.add(
        "EC2",
        Instance::new(
            "t2.micro",
            MachineImage::latest_amazon_linux(),
            Placement::Subnet(private_subnet),
        )
        .with_security_group(&security_group)
        .with_instance_profile(&identity.profile)
        .with_name("private-access-demo-ec2"),
    )?;

    Ok(stack)
}
