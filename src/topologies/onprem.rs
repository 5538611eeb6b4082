//! The simulated on-premises network: a VPC with two software routers that
//! front two private server subnets.
//!
//! Each router has a private interface (the next hop for traffic towards AWS)
//! and a public interface carrying an Elastic IP. With `vpn` enabled every
//! router is also declared as a customer gateway.

use crate::cidr::Cidr;
use crate::error::Result;
use crate::resources::{
    CustomerGateway, EipAssociation, ElasticIp, Instance, InternetGateway, IpAddressSource,
    LogicalId, MachineImage, NetworkInterface, NextHop, Placement, Route, RouteTable,
    SecurityGroup, SecurityGroupIngress, SecurityGroupRule, Subnet, SubnetRouteTableAssociation,
    UserData, VpcEndpoint, VpcGatewayAttachment, Vpc,
};
use crate::stack::{OutputValue, Scope};

use super::cidrs::HybridPlan;
use super::common::{instance_identity, session_manager_endpoints, session_manager_policy};

const NAME: &str = "onprem-network";

/// Ubuntu image the routers boot from.
pub const ROUTER_AMI: &str = "ami-0ac80df6eff0e70b5";

/// BGP ASN advertised by the on-premises routers.
pub const ROUTER_BGP_ASN: u32 = 65016;

const ROUTER_ASSETS: &str =
    "https://raw.githubusercontent.com/acantril/learn-cantrill-io-labs/master/aws-hybrid-bgpvpn/OnPremRouter1";

const ROUTER_ASSET_FILES: [&str; 5] = [
    "ipsec-vti.sh",
    "ipsec.conf",
    "ipsec.secrets",
    "51-eth1.yaml",
    "ffrouting-install.sh",
];

/// Bootstrap script installing strongSwan and the router configuration.
pub fn router_user_data() -> UserData {
    let mut commands = vec![
        "apt-get update && apt-get install -y strongswan wget".to_string(),
        "mkdir /home/ubuntu/demo_assets".to_string(),
        "cd /home/ubuntu/demo_assets".to_string(),
    ];
    commands.extend(
        ROUTER_ASSET_FILES
            .iter()
            .map(|file| format!("wget {}/{}", ROUTER_ASSETS, file)),
    );
    commands.extend([
        "chown ubuntu:ubuntu /home/ubuntu/demo_assets -R".to_string(),
        "cp /home/ubuntu/demo_assets/51-eth1.yaml /etc/netplan".to_string(),
        "netplan --debug apply".to_string(),
    ]);
    UserData::for_linux(commands)
}

/// Logical ids of one declared router.
#[derive(Debug, Clone)]
pub struct Router {
    /// Interface in the router's private subnet
    pub private_interface: LogicalId,
    /// Interface in the public subnet
    pub public_interface: LogicalId,
    /// Elastic IP of the public interface
    pub elastic_ip: LogicalId,
    /// Association of the Elastic IP with the public interface
    pub elastic_ip_association: LogicalId,
    /// The instance
    pub instance: LogicalId,
    /// Customer gateway, when declared for a VPN
    pub customer_gateway: Option<LogicalId>,
}

/// Logical ids of the declared on-premises network.
#[derive(Debug, Clone)]
pub struct OnPremNetwork {
    /// VPC
    pub vpc: LogicalId,
    /// Public subnet
    pub public_subnet: LogicalId,
    /// Private subnets, one per router
    pub private_subnets: [LogicalId; 2],
    /// Internet gateway
    pub internet_gateway: LogicalId,
    /// Internet gateway attachment
    pub internet_gateway_attachment: LogicalId,
    /// Shared security group
    pub security_group: LogicalId,
    /// Routers A and B
    pub routers: [Router; 2],
    /// Servers A and B
    pub servers: [LogicalId; 2],
}

struct RouterSite<'a> {
    letter: char,
    private_subnet: &'a LogicalId,
    private_table: &'a LogicalId,
    public_subnet: &'a LogicalId,
    security_group: &'a LogicalId,
    profile: &'a LogicalId,
    igw_attachment: &'a LogicalId,
    aws_range: Cidr,
    zone: &'a str,
}

/// Declare the on-premises network in `scope`.
///
/// Everything is placed in the first zone of the stack.
pub fn onprem_network(scope: &mut Scope<'_>, plan: &HybridPlan, vpn: bool) -> Result<OnPremNetwork> {
    let zone = scope.availability_zone(0)?;

    let vpc = scope.add("Vpc", Vpc::new(plan.onprem_vpc).with_name(NAME))?;
    let public_subnet = scope.add(
        "PublicSubnet",
        Subnet::new(&vpc, plan.onprem_public_subnet, zone.clone()),
    )?;
    let private_subnet_a = scope.add(
        "PrivateSubnetA",
        Subnet::new(&vpc, plan.onprem_private_subnets[0], zone.clone()),
    )?;
    let private_subnet_b = scope.add(
        "PrivateSubnetB",
        Subnet::new(&vpc, plan.onprem_private_subnets[1], zone.clone()),
    )?;

    let public_table = scope.add(
        "PublicSubnetRouteTable",
        RouteTable::new(&vpc).with_name(format!("{}-public_subnet_route_table", NAME)),
    )?;
    let private_table_a = scope.add(
        "PrivateSubnetARouteTable",
        RouteTable::new(&vpc).with_name(format!("{}-private_subnet_A_route_table", NAME)),
    )?;
    let private_table_b = scope.add(
        "PrivateSubnetBRouteTable",
        RouteTable::new(&vpc).with_name(format!("{}-private_subnet_B_route_table", NAME)),
    )?;

    let security_group = scope.add(
        "EC2SecurityGroup",
        SecurityGroup::new(&vpc, "On-Prem network default security group")
            .with_group_name(format!("{}-ec2-sg", NAME))
            .with_ingress(
                SecurityGroupRule::all_traffic(plan.aws_vpc)
                    .with_description("Allow All from AWS Environment"),
            ),
    )?;
    scope.add(
        "EC2SecurityGroupSelfReferenceRule",
        SecurityGroupIngress::self_reference(&security_group),
    )?;

    let igw = scope.add(
        "IGW",
        InternetGateway::new().with_name(format!("{}-igw", NAME)),
    )?;
    let igw_attachment = scope.add("IGWAttach", VpcGatewayAttachment::new(&vpc, &igw))?;

    let public_default_route = scope.add(
        "PublicSubnetRouteTableDefaultRoute",
        Route::default_route(&public_table, NextHop::InternetGateway(igw.clone())),
    )?;
    scope.add_dependency(&public_default_route, &igw_attachment)?;

    scope.add(
        "PublicSubnetRTAssoc",
        SubnetRouteTableAssociation::new(&public_subnet, &public_table),
    )?;
    scope.add(
        "PrivateSubnetARTAssoc",
        SubnetRouteTableAssociation::new(&private_subnet_a, &private_table_a),
    )?;
    scope.add(
        "PrivateSubnetBRTAssoc",
        SubnetRouteTableAssociation::new(&private_subnet_b, &private_table_b),
    )?;

    session_manager_endpoints(scope, &vpc, &[&public_subnet], &security_group)?;
    scope.add(
        "S3GatewayEndpoint",
        VpcEndpoint::gateway(
            &vpc,
            "s3",
            &[&public_table, &private_table_a, &private_table_b],
        ),
    )?;

    let identity = instance_identity(
        scope,
        &format!("{}-ec2-iam-role", NAME),
        session_manager_policy(),
    )?;

    let site = |letter, private_subnet, private_table| RouterSite {
        letter,
        private_subnet,
        private_table,
        public_subnet: &public_subnet,
        security_group: &security_group,
        profile: &identity.profile,
        igw_attachment: &igw_attachment,
        aws_range: plan.aws_vpc,
        zone: &zone,
    };
    let router_a = declare_router(scope, &site('A', &private_subnet_a, &private_table_a), vpn)?;
    let router_b = declare_router(scope, &site('B', &private_subnet_b, &private_table_b), vpn)?;

    let server = |subnet: &LogicalId, suffix: char| {
        Instance::new(
            "t2.micro",
            MachineImage::latest_amazon_linux(),
            Placement::Subnet(subnet.clone()),
        )
        .with_security_group(&security_group)
        .with_instance_profile(&identity.profile)
        .with_name(format!("onprem-server-{}", suffix))
    };
    let server_a = scope.add("ServerA", server(&private_subnet_a, 'a'))?;
    let server_b = scope.add("ServerB", server(&private_subnet_b, 'b'))?;

    for (letter, router) in [('A', &router_a), ('B', &router_b)] {
        scope.add_output(
            &format!("Router{}PublicIP", letter),
            format!("Public IP of Router {}", letter),
            OutputValue::GetAtt(router.instance.clone(), "PublicIp".to_string()),
        )?;
        scope.add_output(
            &format!("Router{}PrivateIP", letter),
            format!("Private IP of Router {}", letter),
            OutputValue::GetAtt(router.instance.clone(), "PrivateIp".to_string()),
        )?;
    }

    Ok(OnPremNetwork {
        vpc,
        public_subnet,
        private_subnets: [private_subnet_a, private_subnet_b],
        internet_gateway: igw,
        internet_gateway_attachment: igw_attachment,
        security_group,
        routers: [router_a, router_b],
        servers: [server_a, server_b],
    })
}

fn declare_router(scope: &mut Scope<'_>, site: &RouterSite<'_>, vpn: bool) -> Result<Router> {
    let letter = site.letter;
    let interface = |subnet: &LogicalId, side: &str| {
        NetworkInterface::new(subnet)
            .forwarding()
            .with_description(format!("OnPrem Router{} {} Interface", letter, capitalize(side)))
            .with_security_group(site.security_group)
            .with_name(format!("onprem-router{}-{}-network-interface", letter, side))
    };

    let private_interface = scope.add(
        &format!("Router{}PrivateNetworkInterface", letter),
        interface(site.private_subnet, "private"),
    )?;
    let public_interface = scope.add(
        &format!("Router{}PublicNetworkInterface", letter),
        interface(site.public_subnet, "public"),
    )?;

    let elastic_ip = scope.add(&format!("Router{}ElasticIP", letter), ElasticIp::new())?;
    scope.add_dependency(&elastic_ip, site.igw_attachment)?;
    let elastic_ip_association = scope.add(
        &format!("Router{}ElasticIPAssoc", letter),
        EipAssociation::new(&elastic_ip, &public_interface),
    )?;

    let instance = scope.add(
        &format!("Router{}", letter),
        Instance::new(
            "t3.small",
            MachineImage::Ami(ROUTER_AMI.to_string()),
            Placement::interfaces(&[&public_interface, &private_interface]),
        )
        .with_availability_zone(site.zone)
        .with_instance_profile(site.profile)
        .with_user_data(router_user_data())
        .with_name(format!("onprem-router-{}", letter)),
    )?;

    // Traffic for AWS leaves the private subnet through the router.
    scope.add(
        &format!("PrivateSubnet{}RouteTableRoute", letter),
        Route::new(
            site.private_table,
            site.aws_range,
            NextHop::NetworkInterface(private_interface.clone()),
        ),
    )?;

    let customer_gateway = if vpn {
        let cgw = scope.add(
            &format!("Router{}CGW", letter),
            CustomerGateway::new(
                ROUTER_BGP_ASN,
                IpAddressSource::InstancePublicIp(instance.clone()),
            )
            .with_device_name(format!("onprem-router-{}-cgw", letter)),
        )?;
        scope.add_dependency(&cgw, &instance)?;
        scope.add_dependency(&cgw, &elastic_ip_association)?;
        Some(cgw)
    } else {
        None
    };

    Ok(Router {
        private_interface,
        public_interface,
        elastic_ip,
        elastic_ip_association,
        instance,
        customer_gateway,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_user_data() {
        let script = router_user_data().render();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert_eq!(script.matches("wget https://").count(), 5);
        assert!(script.ends_with("netplan --debug apply"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("private"), "Private");
        assert_eq!(capitalize(""), "");
    }
}
