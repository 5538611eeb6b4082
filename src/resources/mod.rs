//! Typed resource declarations.
//!
//! Each declaration is a plain value that knows three things: its
//! CloudFormation type, the `Properties` block it synthesizes to, and the
//! logical ids it refers to. Those references are the natural edges of the
//! declaration graph; explicit ordering edges live on the [`Stack`].
//!
//! [`Stack`]: crate::stack::Stack

mod compute;
mod endpoint;
mod gateway;
mod iam;
mod network;
mod routing;
mod security;

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

pub use compute::{Instance, InterfaceAttachment, MachineImage, NetworkInterface, Placement, UserData};
pub use endpoint::{EndpointType, VpcEndpoint};
pub use gateway::{
    CustomerGateway, EipAssociation, ElasticIp, InternetGateway, IpAddressSource, NatGateway,
    TransitGateway, TransitGatewayAttachment, VpcGatewayAttachment,
};
pub use iam::{Effect, IamRole, InstanceProfile, PolicyDocument, PolicyStatement};
pub use network::{Subnet, SubnetRouteTableAssociation, Vpc};
pub use routing::{NextHop, Route, RouteTable};
pub use security::{Peer, PortRange, Protocol, SecurityGroup, SecurityGroupIngress, SecurityGroupRule};

/// A CloudFormation logical id.
///
/// Logical ids are ASCII alphanumeric and at most 255 characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Longest id CloudFormation accepts.
    pub const MAX_LEN: usize = 255;

    /// Validate and wrap a logical id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_logical_id(id, "must not be empty"));
        }
        if id.len() > Self::MAX_LEN {
            return Err(Error::invalid_logical_id(
                id,
                format!("must be at most {} characters", Self::MAX_LEN),
            ));
        }
        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(Error::invalid_logical_id(
                id.clone(),
                format!("character '{}' is not alphanumeric", c),
            ));
        }
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{"Ref": id}`
    pub fn reference(&self) -> Value {
        json!({ "Ref": self.0 })
    }

    /// `{"Fn::GetAtt": [id, attribute]}`
    pub fn get_att(&self, attribute: &str) -> Value {
        json!({ "Fn::GetAtt": [self.0, attribute] })
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LogicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A resource tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The conventional `Name` tag.
    pub fn name(value: impl Into<String>) -> Self {
        Self::new("Name", value)
    }
}

/// A data reference from one resource property to another resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Property carrying the reference
    pub property: &'static str,
    /// Referenced logical id
    pub target: LogicalId,
    /// Kinds the target is allowed to be
    pub expected: &'static [ResourceKind],
}

impl Reference {
    /// Create a new reference.
    pub fn new(property: &'static str, target: &LogicalId, expected: &'static [ResourceKind]) -> Self {
        Self {
            property,
            target: target.clone(),
            expected,
        }
    }

    /// Whether `kind` satisfies this reference.
    pub fn accepts(&self, kind: ResourceKind) -> bool {
        self.expected.contains(&kind)
    }
}

/// Ordered `Properties` builder.
#[derive(Debug, Default)]
pub struct Properties(Map<String, Value>);

impl Properties {
    /// Create an empty property block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set a property when a value is present.
    pub fn set_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Set the `Tags` property, omitted when empty.
    pub fn tags(self, tags: &[Tag]) -> Self {
        if tags.is_empty() {
            return self;
        }
        let tags: Vec<Value> = tags
            .iter()
            .map(|t| json!({ "Key": t.key, "Value": t.value }))
            .collect();
        self.set("Tags", tags)
    }

    /// Finish building.
    pub fn build(self) -> Map<String, Value> {
        self.0
    }
}

/// Behaviour shared by every declaration.
pub trait Declaration {
    /// Kind of this declaration.
    const KIND: ResourceKind;

    /// Synthesized `Properties` block.
    fn properties(&self) -> Map<String, Value>;

    /// Logical ids this declaration refers to.
    fn references(&self) -> Vec<Reference>;
}

macro_rules! declare_resources {
    ($($variant:ident => $cfn_type:literal),+ $(,)?) => {
        /// The kind of a declared resource.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum ResourceKind {
            $(
                #[doc = concat!("`", $cfn_type, "`")]
                $variant,
            )+
        }

        impl ResourceKind {
            /// CloudFormation resource type.
            pub fn cfn_type(&self) -> &'static str {
                match self {
                    $(Self::$variant => $cfn_type,)+
                }
            }

            /// Short name used in reports.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        /// Any declared resource.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Resource {
            $(
                #[allow(missing_docs)]
                $variant($variant),
            )+
        }

        impl Resource {
            /// Kind of the wrapped declaration.
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(Self::$variant(_) => ResourceKind::$variant,)+
                }
            }

            /// Synthesized `Properties` block.
            pub fn properties(&self) -> Map<String, Value> {
                match self {
                    $(Self::$variant(r) => r.properties(),)+
                }
            }

            /// Logical ids the wrapped declaration refers to.
            pub fn references(&self) -> Vec<Reference> {
                match self {
                    $(Self::$variant(r) => r.references(),)+
                }
            }
        }

        $(
            impl From<$variant> for Resource {
                fn from(resource: $variant) -> Self {
                    Self::$variant(resource)
                }
            }
        )+
    };
}

declare_resources! {
    Vpc => "AWS::EC2::VPC",
    Subnet => "AWS::EC2::Subnet",
    RouteTable => "AWS::EC2::RouteTable",
    Route => "AWS::EC2::Route",
    SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
    InternetGateway => "AWS::EC2::InternetGateway",
    VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
    ElasticIp => "AWS::EC2::EIP",
    EipAssociation => "AWS::EC2::EIPAssociation",
    NatGateway => "AWS::EC2::NatGateway",
    TransitGateway => "AWS::EC2::TransitGateway",
    TransitGatewayAttachment => "AWS::EC2::TransitGatewayAttachment",
    CustomerGateway => "AWS::EC2::CustomerGateway",
    SecurityGroup => "AWS::EC2::SecurityGroup",
    SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
    NetworkInterface => "AWS::EC2::NetworkInterface",
    VpcEndpoint => "AWS::EC2::VPCEndpoint",
    IamRole => "AWS::IAM::Role",
    InstanceProfile => "AWS::IAM::InstanceProfile",
    Instance => "AWS::EC2::Instance",
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_id_validation() {
        assert!(LogicalId::new("AWSVpc").is_ok());
        assert!(LogicalId::new("").is_err());
        assert!(LogicalId::new("Has-Dash").is_err());
        assert!(LogicalId::new("x".repeat(256)).is_err());
        assert!(LogicalId::new("x".repeat(255)).is_ok());
    }

    #[test]
    fn test_intrinsics() {
        let id = LogicalId::new("Sg").unwrap();
        assert_eq!(id.reference(), json!({ "Ref": "Sg" }));
        assert_eq!(id.get_att("GroupId"), json!({ "Fn::GetAtt": ["Sg", "GroupId"] }));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ResourceKind::ElasticIp.cfn_type(), "AWS::EC2::EIP");
        assert_eq!(ResourceKind::IamRole.to_string(), "IamRole");
    }

    #[test]
    fn test_properties_builder_skips_empty() {
        let props = Properties::new()
            .set("A", 1)
            .set_opt::<String>("B", None)
            .tags(&[])
            .build();
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("A"));
    }
}
