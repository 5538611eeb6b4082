//! Security groups and their rules.

use serde_json::{json, Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind};
use crate::cidr::Cidr;

/// IP protocol of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
    /// Every protocol (`-1`)
    All,
}

impl Protocol {
    /// Value of the `IpProtocol` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }
}

/// Inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    /// First port
    pub from: u16,
    /// Last port
    pub to: u16,
}

impl PortRange {
    /// A single port.
    pub fn single(port: u16) -> Self {
        Self { from: port, to: port }
    }

    /// Whether `port` is in the range.
    pub fn contains(&self, port: u16) -> bool {
        (self.from..=self.to).contains(&port)
    }
}

fn rule_body(protocol: Protocol, ports: Option<PortRange>, description: Option<&str>) -> Properties {
    let mut props = Properties::new().set_opt("Description", description);
    if let Some(range) = ports {
        props = props.set("FromPort", range.from).set("ToPort", range.to);
    }
    props.set("IpProtocol", protocol.as_str())
}

/// An inline rule with a literal CIDR peer.
///
/// Rules that refer to a group (including the owning group itself) are
/// declared separately as [`SecurityGroupIngress`].
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroupRule {
    /// Protocol
    pub protocol: Protocol,
    /// Port range, absent for protocols without ports
    pub ports: Option<PortRange>,
    /// Peer address range
    pub cidr: Cidr,
    /// Description
    pub description: Option<String>,
}

impl SecurityGroupRule {
    /// Allow one TCP port from `cidr`.
    pub fn tcp(port: u16, cidr: Cidr) -> Self {
        Self {
            protocol: Protocol::Tcp,
            ports: Some(PortRange::single(port)),
            cidr,
            description: None,
        }
    }

    /// Allow every protocol from `cidr`.
    pub fn all_traffic(cidr: Cidr) -> Self {
        Self {
            protocol: Protocol::All,
            ports: None,
            cidr,
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this rule opens `port` to the whole internet.
    pub fn exposes_to_world(&self, port: u16) -> bool {
        if !self.cidr.is_any() {
            return false;
        }
        match self.protocol {
            Protocol::All => true,
            Protocol::Tcp => self.ports.map_or(true, |p| p.contains(port)),
            Protocol::Udp | Protocol::Icmp => false,
        }
    }

    fn to_json(&self, peer_key: &str) -> Value {
        let props = rule_body(self.protocol, self.ports, self.description.as_deref())
            .set(peer_key, self.cidr.to_string())
            .build();
        Value::Object(props)
    }
}

/// A security group owned by one network.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroup {
    /// Owning network
    pub vpc: LogicalId,
    /// Group description, required by the provider
    pub description: String,
    /// Group name
    pub group_name: Option<String>,
    /// Inline ingress rules
    pub ingress: Vec<SecurityGroupRule>,
    /// Inline egress rules
    pub egress: Vec<SecurityGroupRule>,
    /// Emit the allow-all egress rule when `egress` is empty
    pub allow_all_outbound: bool,
}

impl SecurityGroup {
    /// A group allowing all outbound traffic and no inbound traffic.
    pub fn new(vpc: &LogicalId, description: impl Into<String>) -> Self {
        Self {
            vpc: vpc.clone(),
            description: description.into(),
            group_name: None,
            ingress: Vec::new(),
            egress: Vec::new(),
            allow_all_outbound: true,
        }
    }

    /// Set the group name.
    pub fn with_group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    /// Add an ingress rule.
    pub fn with_ingress(mut self, rule: SecurityGroupRule) -> Self {
        self.ingress.push(rule);
        self
    }

    /// Add an egress rule.
    pub fn with_egress(mut self, rule: SecurityGroupRule) -> Self {
        self.egress.push(rule);
        self
    }
}

impl Declaration for SecurityGroup {
    const KIND: ResourceKind = ResourceKind::SecurityGroup;

    fn properties(&self) -> Map<String, Value> {
        let ingress: Vec<Value> = self.ingress.iter().map(|r| r.to_json("CidrIp")).collect();
        let mut egress: Vec<Value> = self.egress.iter().map(|r| r.to_json("CidrIp")).collect();
        if egress.is_empty() && self.allow_all_outbound {
            egress.push(json!({
                "CidrIp": "0.0.0.0/0",
                "Description": "Allow all outbound traffic by default",
                "IpProtocol": "-1",
            }));
        }

        let mut props = Properties::new()
            .set("GroupDescription", self.description.as_str())
            .set_opt("GroupName", self.group_name.as_deref());
        if !egress.is_empty() {
            props = props.set("SecurityGroupEgress", egress);
        }
        if !ingress.is_empty() {
            props = props.set("SecurityGroupIngress", ingress);
        }
        props.set("VpcId", self.vpc.reference()).build()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new("VpcId", &self.vpc, &[ResourceKind::Vpc])]
    }
}

/// Source of a standalone ingress rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    /// Literal address range
    Cidr(Cidr),
    /// Members of a security group
    SecurityGroup(LogicalId),
}

/// A standalone ingress rule, used for group-to-group and self-reference rules.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroupIngress {
    /// Group receiving the rule
    pub group: LogicalId,
    /// Protocol
    pub protocol: Protocol,
    /// Port range
    pub ports: Option<PortRange>,
    /// Traffic source
    pub source: Peer,
    /// Description
    pub description: Option<String>,
}

impl SecurityGroupIngress {
    /// Allow all traffic between members of `group`.
    pub fn self_reference(group: &LogicalId) -> Self {
        Self {
            group: group.clone(),
            protocol: Protocol::All,
            ports: None,
            source: Peer::SecurityGroup(group.clone()),
            description: None,
        }
    }

    /// Create a rule from an arbitrary source.
    pub fn new(group: &LogicalId, protocol: Protocol, ports: Option<PortRange>, source: Peer) -> Self {
        Self {
            group: group.clone(),
            protocol,
            ports,
            source,
            description: None,
        }
    }

    /// Whether the rule admits members of its own group.
    pub fn is_self_reference(&self) -> bool {
        matches!(&self.source, Peer::SecurityGroup(id) if *id == self.group)
    }
}

impl Declaration for SecurityGroupIngress {
    const KIND: ResourceKind = ResourceKind::SecurityGroupIngress;

    fn properties(&self) -> Map<String, Value> {
        let props = rule_body(self.protocol, self.ports, self.description.as_deref())
            .set("GroupId", self.group.get_att("GroupId"));
        let props = match &self.source {
            Peer::Cidr(cidr) => props.set("CidrIp", cidr.to_string()),
            Peer::SecurityGroup(id) => props.set("SourceSecurityGroupId", id.get_att("GroupId")),
        };
        props.build()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::new("GroupId", &self.group, &[ResourceKind::SecurityGroup])];
        if let Peer::SecurityGroup(id) = &self.source {
            refs.push(Reference::new(
                "SourceSecurityGroupId",
                id,
                &[ResourceKind::SecurityGroup],
            ));
        }
        refs
    }
}
