//! Integration tests for stack validation rules

mod common;

use common::*;
use vpc_topologies::prelude::*;
use vpc_topologies::resources::{
    CustomerGateway, EipAssociation, ElasticIp, IamRole, Instance, InstanceProfile,
    InterfaceAttachment, InternetGateway, IpAddressSource, MachineImage, NatGateway,
    NetworkInterface, NextHop, Peer, Placement, PolicyDocument, PolicyStatement, Protocol, Route,
    RouteTable, SecurityGroup, SecurityGroupIngress, SecurityGroupRule, Subnet,
    SubnetRouteTableAssociation, TransitGateway, TransitGatewayAttachment, Vpc,
    VpcGatewayAttachment,
};

fn rules(report: &ValidationReport) -> Vec<&'static str> {
    report.violations.iter().map(|v| v.rule_id).collect()
}

fn ami() -> MachineImage {
    MachineImage::Ami("ami-12345678".to_string())
}

#[test]
fn test_minimal_network_is_clean() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");

    let report = stack.validate();
    assert!(report.violations.is_empty(), "{:?}", report.violations);
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_v001_undeclared_reference() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    stack
        .add(
            "Route",
            Route::default_route(&net.route_table, NextHop::NatGateway(id("MissingNat"))),
        )
        .unwrap();

    let report = stack.validate();
    let found = report.by_rule("V001");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].resource.as_deref(), Some("Route"));
    assert!(found[0].message.contains("MissingNat"));
}

#[test]
fn test_v002_wrong_kind() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    // The VPC is not a subnet.
    stack
        .add(
            "Assoc",
            SubnetRouteTableAssociation::new(&net.vpc, &net.route_table),
        )
        .unwrap();

    let report = stack.validate();
    let found = report.by_rule("V002");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("expected Subnet"));
}

// ============================================================================
// Address plan
// ============================================================================

#[test]
fn test_v003_subnet_outside_network() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    associated_subnet(&mut stack, &net, "SubnetA", "10.1.0.0/24", "us-east-1a");

    assert_eq!(rules(&stack.validate()), vec!["V003"]);
}

#[test]
fn test_v004_overlapping_subnets() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/23", "us-east-1a");
    associated_subnet(&mut stack, &net, "SubnetB", "10.0.1.0/24", "us-east-1b");

    let report = stack.validate();
    assert_eq!(rules(&report), vec!["V004"]);
    assert_eq!(report.violations[0].resource.as_deref(), Some("SubnetB"));
}

#[test]
fn test_same_range_in_two_networks_is_fine() {
    let mut stack = empty_stack();
    let first = network(&mut stack, "10.0.0.0/16");
    associated_subnet(&mut stack, &first, "SubnetA", "10.0.0.0/24", "us-east-1a");

    let vpc = stack.add("OtherVpc", Vpc::new(cidr("10.0.0.0/16"))).unwrap();
    let table = stack
        .add("OtherTable", RouteTable::new(&vpc))
        .unwrap();
    let second = Network {
        vpc,
        route_table: table,
    };
    associated_subnet(&mut stack, &second, "OtherSubnet", "10.0.0.0/24", "us-east-1a");

    assert!(!stack.validate().has_errors());
}

// ============================================================================
// Routes
// ============================================================================

#[test]
fn test_v005_duplicate_destination() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let eip = stack.add("Eip", ElasticIp::new()).unwrap();
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let nat = stack
        .add("Nat", NatGateway::new(&eip, &subnet))
        .unwrap();
    stack
        .add(
            "RouteOne",
            Route::default_route(&net.route_table, NextHop::NatGateway(nat.clone())),
        )
        .unwrap();
    stack
        .add(
            "RouteTwo",
            Route::default_route(&net.route_table, NextHop::NatGateway(nat)),
        )
        .unwrap();

    let report = stack.validate();
    let found = report.by_rule("V005");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].resource.as_deref(), Some("RouteTwo"));
}

#[test]
fn test_v006_internet_gateway_route_needs_edge() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let igw = stack.add("Igw", InternetGateway::new()).unwrap();
    let attachment = stack
        .add("IgwAttach", VpcGatewayAttachment::new(&net.vpc, &igw))
        .unwrap();
    let route = stack
        .add(
            "DefaultRoute",
            Route::default_route(&net.route_table, NextHop::InternetGateway(igw)),
        )
        .unwrap();

    assert_eq!(rules(&stack.validate()), vec!["V006"]);

    stack.add_dependency(&route, &attachment).unwrap();
    assert!(stack.validate().violations.is_empty());
}

#[test]
fn test_v006_gateway_never_attached() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let tgw = stack.add("Tgw", TransitGateway::new()).unwrap();
    stack
        .add(
            "TgwRoute",
            Route::default_route(&net.route_table, NextHop::TransitGateway(tgw)),
        )
        .unwrap();

    let report = stack.validate();
    let found = report.by_rule("V006");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("never attached"));
}

#[test]
fn test_v006_edge_on_route_table_also_orders_route() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let tgw = stack.add("Tgw", TransitGateway::new()).unwrap();
    let attachment = stack
        .add(
            "TgwAttach",
            TransitGatewayAttachment::new(&tgw, &net.vpc, &[&subnet]),
        )
        .unwrap();
    stack
        .add(
            "TgwRoute",
            Route::new(&net.route_table, cidr("192.168.0.0/16"), NextHop::TransitGateway(tgw)),
        )
        .unwrap();
    stack.add_dependency(&net.route_table, &attachment).unwrap();

    assert!(stack.validate().by_rule("V006").is_empty());
}

// ============================================================================
// Associations
// ============================================================================

#[test]
fn test_v007_unassociated_subnet() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    stack
        .add("Lonely", Subnet::new(&net.vpc, cidr("10.0.0.0/24"), "us-east-1a"))
        .unwrap();

    let report = stack.validate();
    assert_eq!(rules(&report), vec!["V007"]);
    assert_eq!(
        report.violations[0].to_string(),
        "[V007] error Lonely: subnet has no route table association"
    );
}

#[test]
fn test_v007_double_association() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let other = stack
        .add("OtherTable", RouteTable::new(&net.vpc))
        .unwrap();
    stack
        .add(
            "SecondAssoc",
            SubnetRouteTableAssociation::new(&subnet, &other),
        )
        .unwrap();

    let report = stack.validate();
    let found = report.by_rule("V007");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("2 route table associations"));
}

// ============================================================================
// Instances
// ============================================================================

#[test]
fn test_v008_zone_mismatch() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    stack
        .add(
            "Server",
            Instance::new("t2.micro", ami(), Placement::Subnet(subnet))
                .with_availability_zone("us-east-1b"),
        )
        .unwrap();

    let report = stack.validate();
    assert_eq!(rules(&report), vec!["V008"]);
    assert!(report.violations[0].message.contains("us-east-1b"));
}

#[test]
fn test_v008_group_from_another_network() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let other = stack
        .add("OtherVpc", Vpc::new(cidr("10.1.0.0/16")))
        .unwrap();
    let group = stack
        .add("ForeignGroup", SecurityGroup::new(&other, "elsewhere"))
        .unwrap();
    stack
        .add(
            "Server",
            Instance::new("t2.micro", ami(), Placement::Subnet(subnet)).with_security_group(&group),
        )
        .unwrap();

    assert_eq!(rules(&stack.validate()), vec!["V008"]);
}

#[test]
fn test_v008_interface_placement() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let group = stack.add("Group", SecurityGroup::new(&net.vpc, "router")).unwrap();
    let eni = stack
        .add("Eni", NetworkInterface::new(&subnet).forwarding())
        .unwrap();

    // Groups on the instance and the same interface twice.
    let router = Instance::new("t3.small", ami(), Placement::interfaces(&[&eni, &eni]))
        .with_security_group(&group)
        .with_availability_zone("us-east-1a");
    stack.add("Router", router).unwrap();

    let report = stack.validate();
    let found = report.by_rule("V008");
    assert!(found
        .iter()
        .any(|v| v.message.contains("must be set on the network interfaces")));
    assert!(found.iter().any(|v| v.message.contains("already attached")));
}

#[test]
fn test_v008_missing_primary_interface() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let subnet = associated_subnet(&mut stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let eni = stack.add("Eni", NetworkInterface::new(&subnet)).unwrap();
    stack
        .add(
            "Router",
            Instance::new(
                "t3.small",
                ami(),
                Placement::NetworkInterfaces(vec![InterfaceAttachment {
                    device_index: 1,
                    network_interface: eni,
                }]),
            ),
        )
        .unwrap();

    let report = stack.validate();
    assert_eq!(report.by_rule("V008").len(), 1);
    assert!(report.violations[0].message.contains("device index 0"));
}

// ============================================================================
// Customer gateways
// ============================================================================

fn router_with_eip(stack: &mut Stack) -> (LogicalId, LogicalId) {
    let net = network(stack, "10.0.0.0/16");
    let subnet = associated_subnet(stack, &net, "SubnetA", "10.0.0.0/24", "us-east-1a");
    let eni = stack.add("Eni", NetworkInterface::new(&subnet)).unwrap();
    let eip = stack.add("Eip", ElasticIp::new()).unwrap();
    let association = stack.add("EipAssoc", EipAssociation::new(&eip, &eni)).unwrap();
    let router = stack
        .add(
            "Router",
            Instance::new("t3.small", ami(), Placement::interfaces(&[&eni])),
        )
        .unwrap();
    (router, association)
}

#[test]
fn test_v009_customer_gateway_ordering() {
    let mut stack = empty_stack();
    let (router, association) = router_with_eip(&mut stack);
    let cgw = stack
        .add(
            "Cgw",
            CustomerGateway::new(65016, IpAddressSource::InstancePublicIp(router.clone())),
        )
        .unwrap();

    let report = stack.validate();
    assert_eq!(report.by_rule("V009").len(), 2);

    stack.add_dependency(&cgw, &router).unwrap();
    let report = stack.validate();
    let found = report.by_rule("V009");
    assert_eq!(found.len(), 1);
    assert!(found[0].message.contains("EipAssoc"));

    stack.add_dependency(&cgw, &association).unwrap();
    assert!(stack.validate().violations.is_empty());
}

#[test]
fn test_v009_literal_address_needs_nothing() {
    let mut stack = empty_stack();
    stack
        .add(
            "Cgw",
            CustomerGateway::new(
                65000,
                IpAddressSource::Literal("203.0.113.10".parse().unwrap()),
            ),
        )
        .unwrap();
    assert!(stack.validate().violations.is_empty());
}

// ============================================================================
// Cycles and profiles
// ============================================================================

#[test]
fn test_v010_cycle_blocks_synthesis() {
    let mut stack = empty_stack();
    let a = stack.add("GatewayA", InternetGateway::new()).unwrap();
    let b = stack.add("GatewayB", InternetGateway::new()).unwrap();
    stack.add_dependency(&a, &b).unwrap();
    stack.add_dependency(&b, &a).unwrap();

    let report = stack.validate();
    let found = report.by_rule("V010");
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].message,
        "dependency cycle: GatewayA -> GatewayB -> GatewayA"
    );

    let err = stack.synthesize().unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_v011_profile_roles() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    stack.add("WrongRole", InstanceProfile::new(&net.vpc)).unwrap();
    stack.add("MissingRole", InstanceProfile::new(&id("Ghost"))).unwrap();
    let mut empty = InstanceProfile::new(&id("Ghost"));
    empty.roles.clear();
    stack.add("NoRole", empty).unwrap();

    let report = stack.validate();
    let found = report.by_rule("V011");
    assert_eq!(found.len(), 3);
    // Profiles are not double-reported as dangling references.
    assert!(report.by_rule("V001").is_empty());
    assert!(report.by_rule("V002").is_empty());
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn test_w101_wildcard_policy() {
    let mut stack = empty_stack();
    stack
        .add(
            "Admin",
            IamRole::for_service("ec2.amazonaws.com").with_inline_policy(
                "root",
                PolicyDocument::new(vec![PolicyStatement::allow_all_resources(["*"])]),
            ),
        )
        .unwrap();
    stack
        .add(
            "Scoped",
            IamRole::for_service("ec2.amazonaws.com").with_inline_policy(
                "root",
                PolicyDocument::new(vec![PolicyStatement::allow_all_resources(["s3:*"])]),
            ),
        )
        .unwrap();

    let report = stack.validate();
    assert_eq!(rules(&report), vec!["W101"]);
    assert!(!report.has_errors());
    assert!(stack.synthesize().is_ok());
}

#[test]
fn test_w102_ssh_exposure() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    let open = stack
        .add(
            "Open",
            SecurityGroup::new(&net.vpc, "open").with_ingress(SecurityGroupRule::tcp(22, Cidr::any())),
        )
        .unwrap();
    stack
        .add(
            "Https",
            SecurityGroup::new(&net.vpc, "web").with_ingress(SecurityGroupRule::tcp(443, Cidr::any())),
        )
        .unwrap();
    stack
        .add(
            "Everything",
            SecurityGroupIngress::new(&open, Protocol::All, None, Peer::Cidr(Cidr::any())),
        )
        .unwrap();
    stack
        .add("SelfRef", SecurityGroupIngress::self_reference(&open))
        .unwrap();

    let report = stack.validate();
    let flagged: Vec<_> = report
        .by_rule("W102")
        .iter()
        .filter_map(|v| v.resource.clone())
        .collect();
    assert_eq!(flagged, vec!["Open", "Everything"]);
}

#[test]
fn test_report_serializes() {
    let mut stack = empty_stack();
    let net = network(&mut stack, "10.0.0.0/16");
    stack
        .add("Lonely", Subnet::new(&net.vpc, cidr("10.0.0.0/24"), "us-east-1a"))
        .unwrap();

    let value = serde_json::to_value(stack.validate()).unwrap();
    assert_eq!(value["stack"], "test");
    assert_eq!(value["violations"][0]["rule_id"], "V007");
    assert_eq!(value["violations"][0]["resource"], "Lonely");
}
