//! Structural validation of a stack.
//!
//! Validation never stops at the first problem: every rule runs and adds its
//! findings to a [`ValidationReport`]. Errors block synthesis, warnings only
//! get logged.
//!
//! | Rule | Severity | Checks |
//! |------|----------|--------|
//! | V001 | error | reference to an undeclared id |
//! | V002 | error | reference to the wrong kind of resource |
//! | V003 | error | subnet CIDR outside its network |
//! | V004 | error | overlapping subnets in one network |
//! | V005 | error | duplicate destination in a route table |
//! | V006 | error | gateway route without an explicit edge to the attachment |
//! | V007 | error | subnet without exactly one route table association |
//! | V008 | error | instance placement |
//! | V009 | error | customer gateway not ordered after its device |
//! | V010 | error | dependency cycle |
//! | V011 | error | instance profile not carrying exactly one declared role |
//! | W101 | warning | wildcard IAM allow |
//! | W102 | warning | SSH open to the world |

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::resources::{
    Instance, LogicalId, NetworkInterface, NextHop, Peer, Placement, Protocol, Resource,
    ResourceKind, Route, SecurityGroup, Subnet, Vpc,
};
use crate::stack::Stack;

const SSH_PORT: u16 = 22;

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Intentional or risky, never blocks synthesis.
    Warning,
    /// Structural defect, blocks synthesis.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Rule identifier, e.g. `V004`
    pub rule_id: &'static str,
    /// Severity
    pub severity: Severity,
    /// Offending resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Description
    pub message: String,
}

impl Violation {
    /// An error on `resource`.
    pub fn error(rule_id: &'static str, resource: &LogicalId, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity: Severity::Error,
            resource: Some(resource.to_string()),
            message: message.into(),
        }
    }

    /// A warning on `resource`.
    pub fn warning(rule_id: &'static str, resource: &LogicalId, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity: Severity::Warning,
            resource: Some(resource.to_string()),
            message: message.into(),
        }
    }

    /// Check if this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.severity)?;
        if let Some(ref resource) = self.resource {
            write!(f, " {}", resource)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// All findings for one stack.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Stack name
    pub stack: String,
    /// Findings in rule order
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            violations: Vec::new(),
        }
    }

    /// Add a finding.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Error findings.
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    /// Warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Findings of one rule.
    pub fn by_rule(&self, rule_id: &str) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.rule_id == rule_id).collect()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_error)
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{}: {} error(s), {} warning(s)",
            self.stack,
            self.error_count(),
            self.warning_count()
        )
    }
}

/// Run every rule against `stack`.
pub fn validate(stack: &Stack) -> ValidationReport {
    let mut report = ValidationReport::new(stack.name());
    check_references(stack, &mut report);
    check_subnet_ranges(stack, &mut report);
    check_routes(stack, &mut report);
    check_associations(stack, &mut report);
    check_instances(stack, &mut report);
    check_customer_gateways(stack, &mut report);
    check_cycles(stack, &mut report);
    check_instance_profiles(stack, &mut report);
    check_iam_wildcards(stack, &mut report);
    check_ssh_exposure(stack, &mut report);
    report
}

fn vpc<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a Vpc> {
    match stack.get(id.as_str()) {
        Some(Resource::Vpc(v)) => Some(v),
        _ => None,
    }
}

fn subnet<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a Subnet> {
    match stack.get(id.as_str()) {
        Some(Resource::Subnet(s)) => Some(s),
        _ => None,
    }
}

fn security_group<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a SecurityGroup> {
    match stack.get(id.as_str()) {
        Some(Resource::SecurityGroup(g)) => Some(g),
        _ => None,
    }
}

fn network_interface<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a NetworkInterface> {
    match stack.get(id.as_str()) {
        Some(Resource::NetworkInterface(n)) => Some(n),
        _ => None,
    }
}

fn instance<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a Instance> {
    match stack.get(id.as_str()) {
        Some(Resource::Instance(i)) => Some(i),
        _ => None,
    }
}

fn route_table_vpc<'a>(stack: &'a Stack, id: &LogicalId) -> Option<&'a LogicalId> {
    match stack.get(id.as_str()) {
        Some(Resource::RouteTable(t)) => Some(&t.vpc),
        _ => None,
    }
}

fn has_explicit(stack: &Stack, dependent: &LogicalId, dependency: &LogicalId) -> bool {
    stack
        .dependencies()
        .any(|(a, b)| a == dependent && b == dependency)
}

fn expected_kinds(kinds: &[ResourceKind]) -> String {
    kinds.iter().map(ResourceKind::name).collect::<Vec<_>>().join(" or ")
}

// V001 / V002
fn check_references(stack: &Stack, report: &mut ValidationReport) {
    for (id, resource) in stack.resources() {
        // Profile roles are covered by V011.
        if resource.kind() == ResourceKind::InstanceProfile {
            continue;
        }
        for reference in resource.references() {
            match stack.get(reference.target.as_str()) {
                None => report.push(Violation::error(
                    "V001",
                    id,
                    format!(
                        "{} refers to undeclared resource '{}'",
                        reference.property, reference.target
                    ),
                )),
                Some(target) if !reference.accepts(target.kind()) => report.push(Violation::error(
                    "V002",
                    id,
                    format!(
                        "{} refers to '{}' which is a {}, expected {}",
                        reference.property,
                        reference.target,
                        target.kind(),
                        expected_kinds(reference.expected)
                    ),
                )),
                Some(_) => {}
            }
        }
    }
}

// V003 / V004
fn check_subnet_ranges(stack: &Stack, report: &mut ValidationReport) {
    let mut by_network: HashMap<&LogicalId, Vec<(&LogicalId, &Subnet)>> = HashMap::new();

    for (id, resource) in stack.resources() {
        let Resource::Subnet(s) = resource else {
            continue;
        };
        let Some(network) = vpc(stack, &s.vpc) else {
            continue;
        };
        if !network.cidr.contains(&s.cidr) {
            report.push(Violation::error(
                "V003",
                id,
                format!(
                    "subnet range {} is outside network '{}' ({})",
                    s.cidr, s.vpc, network.cidr
                ),
            ));
        }

        let siblings = by_network.entry(&s.vpc).or_default();
        for (other_id, other) in siblings.iter() {
            if other.cidr.overlaps(&s.cidr) {
                report.push(Violation::error(
                    "V004",
                    id,
                    format!(
                        "subnet range {} overlaps '{}' ({})",
                        s.cidr, other_id, other.cidr
                    ),
                ));
            }
        }
        siblings.push((id, s));
    }
}

// V005 / V006
fn check_routes(stack: &Stack, report: &mut ValidationReport) {
    let mut seen: HashMap<(&LogicalId, String), &LogicalId> = HashMap::new();

    for (id, resource) in stack.resources() {
        let Resource::Route(route) = resource else {
            continue;
        };

        let key = (&route.route_table, route.destination.to_string());
        if let Some(first) = seen.get(&key) {
            report.push(Violation::error(
                "V005",
                id,
                format!(
                    "route table '{}' already has a route to {} ('{}')",
                    route.route_table, route.destination, first
                ),
            ));
        } else {
            seen.insert(key, id);
        }

        if route.next_hop.requires_attachment() {
            check_route_attachment(stack, id, route, report);
        }
    }
}

fn check_route_attachment(
    stack: &Stack,
    id: &LogicalId,
    route: &Route,
    report: &mut ValidationReport,
) {
    let gateway = route.next_hop.target();
    let table_vpc = route_table_vpc(stack, &route.route_table);

    let attachments: Vec<&LogicalId> = stack
        .resources()
        .filter_map(|(attach_id, resource)| {
            let (attached_gateway, attached_vpc) = match (&route.next_hop, resource) {
                (NextHop::InternetGateway(_), Resource::VpcGatewayAttachment(a)) => {
                    (&a.internet_gateway, &a.vpc)
                }
                (NextHop::TransitGateway(_), Resource::TransitGatewayAttachment(a)) => {
                    (&a.transit_gateway, &a.vpc)
                }
                _ => return None,
            };
            let same_network = table_vpc.map_or(true, |v| v == attached_vpc);
            (attached_gateway == gateway && same_network).then_some(attach_id)
        })
        .collect();

    if attachments.is_empty() {
        report.push(Violation::error(
            "V006",
            id,
            format!("gateway '{}' is never attached to the route's network", gateway),
        ));
        return;
    }

    let ordered = attachments.iter().any(|attachment| {
        has_explicit(stack, id, attachment) || has_explicit(stack, &route.route_table, attachment)
    });
    if !ordered {
        report.push(Violation::error(
            "V006",
            id,
            format!(
                "route via '{}' needs an explicit dependency on attachment '{}'",
                gateway, attachments[0]
            ),
        ));
    }
}

// V007
fn check_associations(stack: &Stack, report: &mut ValidationReport) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, resource) in stack.resources() {
        if let Resource::SubnetRouteTableAssociation(a) = resource {
            *counts.entry(a.subnet.as_str()).or_insert(0) += 1;
        }
    }

    for (id, resource) in stack.resources() {
        if !matches!(resource, Resource::Subnet(_)) {
            continue;
        }
        match counts.get(id.as_str()).copied().unwrap_or(0) {
            1 => {}
            0 => report.push(Violation::error(
                "V007",
                id,
                "subnet has no route table association",
            )),
            n => report.push(Violation::error(
                "V007",
                id,
                format!("subnet has {} route table associations, expected exactly one", n),
            )),
        }
    }
}

// V008
fn check_instances(stack: &Stack, report: &mut ValidationReport) {
    let mut owners: HashMap<&LogicalId, &LogicalId> = HashMap::new();

    for (id, resource) in stack.resources() {
        let Resource::Instance(inst) = resource else {
            continue;
        };

        match &inst.placement {
            Placement::Subnet(subnet_id) => {
                let Some(s) = subnet(stack, subnet_id) else {
                    continue;
                };
                check_zone(id, inst, subnet_id, s, report);
                check_groups_in_network(stack, id, &inst.security_groups, &s.vpc, report);
            }
            Placement::NetworkInterfaces(attachments) => {
                if !inst.security_groups.is_empty() {
                    report.push(Violation::error(
                        "V008",
                        id,
                        "security groups must be set on the network interfaces, not the instance",
                    ));
                }
                if !attachments.iter().any(|a| a.device_index == 0) {
                    report.push(Violation::error(
                        "V008",
                        id,
                        "no network interface at device index 0",
                    ));
                }

                let mut indices = HashMap::new();
                let mut network: Option<&LogicalId> = None;
                for attachment in attachments {
                    let previous = indices.insert(attachment.device_index, &attachment.network_interface);
                    if let Some(previous) = previous {
                        report.push(Violation::error(
                            "V008",
                            id,
                            format!(
                                "device index {} used by both '{}' and '{}'",
                                attachment.device_index, previous, attachment.network_interface
                            ),
                        ));
                    }
                    if let Some(other) = owners.insert(&attachment.network_interface, id) {
                        report.push(Violation::error(
                            "V008",
                            id,
                            format!(
                                "network interface '{}' is already attached to '{}'",
                                attachment.network_interface, other
                            ),
                        ));
                    }

                    let Some(eni) = network_interface(stack, &attachment.network_interface) else {
                        continue;
                    };
                    let Some(s) = subnet(stack, &eni.subnet) else {
                        continue;
                    };
                    check_zone(id, inst, &eni.subnet, s, report);
                    check_groups_in_network(
                        stack,
                        &attachment.network_interface,
                        &eni.security_groups,
                        &s.vpc,
                        report,
                    );
                    match network {
                        None => network = Some(&s.vpc),
                        Some(first) if first != &s.vpc => report.push(Violation::error(
                            "V008",
                            id,
                            format!(
                                "network interface '{}' is in network '{}', expected '{}'",
                                attachment.network_interface, s.vpc, first
                            ),
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

fn check_zone(
    id: &LogicalId,
    inst: &Instance,
    subnet_id: &LogicalId,
    s: &Subnet,
    report: &mut ValidationReport,
) {
    if let Some(zone) = &inst.availability_zone {
        if *zone != s.availability_zone {
            report.push(Violation::error(
                "V008",
                id,
                format!(
                    "instance zone {} differs from subnet '{}' zone {}",
                    zone, subnet_id, s.availability_zone
                ),
            ));
        }
    }
}

fn check_groups_in_network(
    stack: &Stack,
    id: &LogicalId,
    groups: &[LogicalId],
    network: &LogicalId,
    report: &mut ValidationReport,
) {
    for group_id in groups {
        if let Some(group) = security_group(stack, group_id) {
            if group.vpc != *network {
                report.push(Violation::error(
                    "V008",
                    id,
                    format!(
                        "security group '{}' belongs to network '{}', not '{}'",
                        group_id, group.vpc, network
                    ),
                ));
            }
        }
    }
}

// V009
fn check_customer_gateways(stack: &Stack, report: &mut ValidationReport) {
    for (id, resource) in stack.resources() {
        let Resource::CustomerGateway(cgw) = resource else {
            continue;
        };
        let Some(device_id) = cgw.source_instance() else {
            continue;
        };
        let Some(device) = instance(stack, device_id) else {
            continue;
        };

        if !has_explicit(stack, id, device_id) {
            report.push(Violation::error(
                "V009",
                id,
                format!("needs an explicit dependency on instance '{}'", device_id),
            ));
        }

        let associations: Vec<&LogicalId> = stack
            .resources()
            .filter_map(|(assoc_id, r)| match r {
                Resource::EipAssociation(a)
                    if device
                        .interfaces()
                        .iter()
                        .any(|i| i.network_interface == a.network_interface) =>
                {
                    Some(assoc_id)
                }
                _ => None,
            })
            .collect();

        if associations.is_empty() {
            report.push(Violation::error(
                "V009",
                id,
                format!("instance '{}' has no elastic IP associated to its interfaces", device_id),
            ));
        } else if !associations.iter().any(|a| has_explicit(stack, id, a)) {
            report.push(Violation::error(
                "V009",
                id,
                format!(
                    "needs an explicit dependency on elastic IP association '{}'",
                    associations[0]
                ),
            ));
        }
    }
}

// V010
fn check_cycles(stack: &Stack, report: &mut ValidationReport) {
    for cycle in stack.graph().get_cycles() {
        let Some(first) = cycle.first().and_then(|id| LogicalId::new(id.as_str()).ok()) else {
            continue;
        };
        report.push(Violation::error(
            "V010",
            &first,
            format!("dependency cycle: {} -> {}", cycle.join(" -> "), first),
        ));
    }
}

// V011
fn check_instance_profiles(stack: &Stack, report: &mut ValidationReport) {
    for (id, resource) in stack.resources() {
        let Resource::InstanceProfile(profile) = resource else {
            continue;
        };
        if profile.roles.len() != 1 {
            report.push(Violation::error(
                "V011",
                id,
                format!("carries {} roles, expected exactly one", profile.roles.len()),
            ));
        }
        for role in &profile.roles {
            match stack.get(role.as_str()) {
                Some(Resource::IamRole(_)) => {}
                Some(other) => report.push(Violation::error(
                    "V011",
                    id,
                    format!("role '{}' is a {}, expected IamRole", role, other.kind()),
                )),
                None => report.push(Violation::error(
                    "V011",
                    id,
                    format!("role '{}' is not declared", role),
                )),
            }
        }
    }
}

// W101
fn check_iam_wildcards(stack: &Stack, report: &mut ValidationReport) {
    for (id, resource) in stack.resources() {
        if let Resource::IamRole(role) = resource {
            if role.statements().any(|s| s.is_wildcard_allow()) {
                report.push(Violation::warning(
                    "W101",
                    id,
                    "policy allows every action on every resource",
                ));
            }
        }
    }
}

// W102
fn check_ssh_exposure(stack: &Stack, report: &mut ValidationReport) {
    for (id, resource) in stack.resources() {
        let exposed = match resource {
            Resource::SecurityGroup(group) => {
                group.ingress.iter().any(|r| r.exposes_to_world(SSH_PORT))
            }
            Resource::SecurityGroupIngress(rule) => match &rule.source {
                Peer::Cidr(cidr) if cidr.is_any() => match rule.protocol {
                    Protocol::All => true,
                    Protocol::Tcp => rule.ports.map_or(true, |p| p.contains(SSH_PORT)),
                    Protocol::Udp | Protocol::Icmp => false,
                },
                _ => false,
            },
            _ => false,
        };
        if exposed {
            report.push(Violation::warning("W102", id, "SSH is open to 0.0.0.0/0"));
        }
    }
}
