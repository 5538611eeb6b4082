//! Instances and network interfaces.

use serde_json::{json, Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind, Tag};

/// An elastic network interface.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInterface {
    /// Subnet hosting the interface
    pub subnet: LogicalId,
    /// Description
    pub description: Option<String>,
    /// Drop traffic not addressed to the interface; off for routers
    pub source_dest_check: bool,
    /// Security groups on the interface
    pub security_groups: Vec<LogicalId>,
    /// Tags
    pub tags: Vec<Tag>,
}

impl NetworkInterface {
    /// An interface with source/destination checking on.
    pub fn new(subnet: &LogicalId) -> Self {
        Self {
            subnet: subnet.clone(),
            description: None,
            source_dest_check: true,
            security_groups: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Router interface: forwards traffic it does not own.
    pub fn forwarding(mut self) -> Self {
        self.source_dest_check = false;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a security group.
    pub fn with_security_group(mut self, group: &LogicalId) -> Self {
        self.security_groups.push(group.clone());
        self
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }
}

impl Declaration for NetworkInterface {
    const KIND: ResourceKind = ResourceKind::NetworkInterface;

    fn properties(&self) -> Map<String, Value> {
        let groups: Vec<Value> = self.security_groups.iter().map(|g| g.get_att("GroupId")).collect();
        Properties::new()
            .set_opt("Description", self.description.as_deref())
            .set("GroupSet", groups)
            .set("SourceDestCheck", self.source_dest_check)
            .set("SubnetId", self.subnet.reference())
            .tags(&self.tags)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .security_groups
            .iter()
            .map(|g| Reference::new("GroupSet", g, &[ResourceKind::SecurityGroup]))
            .collect();
        refs.push(Reference::new("SubnetId", &self.subnet, &[ResourceKind::Subnet]));
        refs
    }
}

/// Image an instance boots from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineImage {
    /// A fixed AMI id
    Ami(String),
    /// An SSM public parameter resolved at deploy time
    SsmParameter(String),
}

impl MachineImage {
    /// Parameter path of the latest Amazon Linux image.
    pub const AMAZON_LINUX: &'static str =
        "/aws/service/ami-amazon-linux-latest/amzn-ami-hvm-x86_64-gp2";

    /// Latest Amazon Linux, resolved through SSM.
    pub fn latest_amazon_linux() -> Self {
        MachineImage::SsmParameter(Self::AMAZON_LINUX.to_string())
    }

    /// Template parameter id for an SSM-backed image.
    pub fn parameter_id(&self) -> Option<String> {
        match self {
            MachineImage::Ami(_) => None,
            MachineImage::SsmParameter(path) => Some(ssm_parameter_id(path)),
        }
    }

    fn image_id(&self) -> Value {
        match self {
            MachineImage::Ami(ami) => Value::from(ami.as_str()),
            MachineImage::SsmParameter(path) => json!({ "Ref": ssm_parameter_id(path) }),
        }
    }
}

fn ssm_parameter_id(path: &str) -> String {
    let name: String = path.chars().filter(char::is_ascii_alphanumeric).collect();
    format!("SsmParameterValue{}Parameter", name)
}

/// Shell commands run at first boot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    /// Commands, one per line
    pub commands: Vec<String>,
}

impl UserData {
    /// Build user data from commands.
    pub fn for_linux<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// The script as written to the instance.
    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash");
        for command in &self.commands {
            script.push('\n');
            script.push_str(command);
        }
        script
    }
}

/// A network interface attached at a device index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAttachment {
    /// Device index; 0 is the primary interface
    pub device_index: usize,
    /// Attached interface
    pub network_interface: LogicalId,
}

/// How an instance joins the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Directly in a subnet, with security groups on the instance
    Subnet(LogicalId),
    /// Through pre-declared interfaces; the primary interface's subnet is the instance's
    NetworkInterfaces(Vec<InterfaceAttachment>),
}

impl Placement {
    /// Place on interfaces, numbered in the order given.
    pub fn interfaces(interfaces: &[&LogicalId]) -> Self {
        Placement::NetworkInterfaces(
            interfaces
                .iter()
                .enumerate()
                .map(|(i, eni)| InterfaceAttachment {
                    device_index: i,
                    network_interface: (*eni).clone(),
                })
                .collect(),
        )
    }
}

/// An EC2 instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Instance type, e.g. `t2.micro`
    pub instance_type: String,
    /// Boot image
    pub image: MachineImage,
    /// Subnet or interfaces
    pub placement: Placement,
    /// Security groups, only valid with subnet placement
    pub security_groups: Vec<LogicalId>,
    /// Instance profile
    pub instance_profile: Option<LogicalId>,
    /// Explicit zone
    pub availability_zone: Option<String>,
    /// First-boot script
    pub user_data: Option<UserData>,
    /// Tags
    pub tags: Vec<Tag>,
}

impl Instance {
    /// Create a new instance.
    pub fn new(instance_type: impl Into<String>, image: MachineImage, placement: Placement) -> Self {
        Self {
            instance_type: instance_type.into(),
            image,
            placement,
            security_groups: Vec::new(),
            instance_profile: None,
            availability_zone: None,
            user_data: None,
            tags: Vec::new(),
        }
    }

    /// Add a security group.
    pub fn with_security_group(mut self, group: &LogicalId) -> Self {
        self.security_groups.push(group.clone());
        self
    }

    /// Set the instance profile.
    pub fn with_instance_profile(mut self, profile: &LogicalId) -> Self {
        self.instance_profile = Some(profile.clone());
        self
    }

    /// Pin the zone.
    pub fn with_availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = Some(zone.into());
        self
    }

    /// Set the first-boot script.
    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Set the `Name` tag.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tags.push(Tag::name(name));
        self
    }

    /// Interfaces attached to the instance, if placed through interfaces.
    pub fn interfaces(&self) -> &[InterfaceAttachment] {
        match &self.placement {
            Placement::NetworkInterfaces(attachments) => attachments,
            Placement::Subnet(_) => &[],
        }
    }
}

impl Declaration for Instance {
    const KIND: ResourceKind = ResourceKind::Instance;

    fn properties(&self) -> Map<String, Value> {
        let mut props = Properties::new()
            .set_opt("AvailabilityZone", self.availability_zone.as_deref())
            .set_opt(
                "IamInstanceProfile",
                self.instance_profile.as_ref().map(LogicalId::reference),
            )
            .set("ImageId", self.image.image_id())
            .set("InstanceType", self.instance_type.as_str());

        if let Placement::NetworkInterfaces(attachments) = &self.placement {
            let interfaces: Vec<Value> = attachments
                .iter()
                .map(|a| {
                    json!({
                        "DeviceIndex": a.device_index.to_string(),
                        "NetworkInterfaceId": a.network_interface.get_att("Id"),
                    })
                })
                .collect();
            props = props.set("NetworkInterfaces", interfaces);
        }
        if !self.security_groups.is_empty() {
            let groups: Vec<Value> = self.security_groups.iter().map(|g| g.get_att("GroupId")).collect();
            props = props.set("SecurityGroupIds", groups);
        }
        if let Placement::Subnet(subnet) = &self.placement {
            props = props.set("SubnetId", subnet.reference());
        }
        props
            .tags(&self.tags)
            .set_opt(
                "UserData",
                self.user_data
                    .as_ref()
                    .map(|u| json!({ "Fn::Base64": u.render() })),
            )
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        if let Some(profile) = &self.instance_profile {
            refs.push(Reference::new(
                "IamInstanceProfile",
                profile,
                &[ResourceKind::InstanceProfile],
            ));
        }
        match &self.placement {
            Placement::NetworkInterfaces(attachments) => {
                refs.extend(attachments.iter().map(|a| {
                    Reference::new(
                        "NetworkInterfaces",
                        &a.network_interface,
                        &[ResourceKind::NetworkInterface],
                    )
                }));
            }
            Placement::Subnet(subnet) => {
                refs.push(Reference::new("SubnetId", subnet, &[ResourceKind::Subnet]));
            }
        }
        refs.extend(
            self.security_groups
                .iter()
                .map(|g| Reference::new("SecurityGroupIds", g, &[ResourceKind::SecurityGroup])),
        );
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_ssm_image_parameter_id() {
        let image = MachineImage::latest_amazon_linux();
        assert_eq!(
            image.parameter_id().unwrap(),
            "SsmParameterValueawsserviceamiamazonlinuxlatestamznamihvmx8664gp2Parameter"
        );
        assert!(MachineImage::Ami("ami-0ac80df6eff0e70b5".into()).parameter_id().is_none());
    }

    #[test]
    fn test_user_data_render() {
        let data = UserData::for_linux(["apt-get update", "netplan --debug apply"]);
        assert_eq!(data.render(), "#!/bin/bash\napt-get update\nnetplan --debug apply");
    }

    #[test]
    fn test_subnet_instance() {
        let instance = Instance::new(
            "t2.micro",
            MachineImage::latest_amazon_linux(),
            Placement::Subnet(id("SubnetA")),
        )
        .with_security_group(&id("Sg"))
        .with_instance_profile(&id("Profile"))
        .with_name("aws-private-network-ec2-a");

        let props = instance.properties();
        assert_eq!(props["SubnetId"], json!({ "Ref": "SubnetA" }));
        assert_eq!(props["IamInstanceProfile"], json!({ "Ref": "Profile" }));
        assert_eq!(props["SecurityGroupIds"], json!([{ "Fn::GetAtt": ["Sg", "GroupId"] }]));
        assert!(props["ImageId"]["Ref"].is_string());
        assert!(!props.contains_key("NetworkInterfaces"));
        assert_eq!(instance.references().len(), 3);
    }

    #[test]
    fn test_router_instance() {
        let router = Instance::new(
            "t3.small",
            MachineImage::Ami("ami-0ac80df6eff0e70b5".into()),
            Placement::interfaces(&[&id("PublicEni"), &id("PrivateEni")]),
        )
        .with_availability_zone("us-east-1a")
        .with_user_data(UserData::for_linux(["echo hi"]));

        let props = router.properties();
        assert_eq!(props["ImageId"], json!("ami-0ac80df6eff0e70b5"));
        assert_eq!(props["NetworkInterfaces"][1]["DeviceIndex"], json!("1"));
        assert_eq!(props["UserData"], json!({ "Fn::Base64": "#!/bin/bash\necho hi" }));
        assert!(!props.contains_key("SubnetId"));
        assert_eq!(router.interfaces().len(), 2);
    }

    #[test]
    fn test_interface_indices_stay_distinct() {
        let enis: Vec<LogicalId> = (0..300).map(|i| id(&format!("Eni{}", i))).collect();
        let refs: Vec<&LogicalId> = enis.iter().collect();
        let Placement::NetworkInterfaces(attachments) = Placement::interfaces(&refs) else {
            panic!("expected interface placement");
        };

        let indices: std::collections::HashSet<usize> =
            attachments.iter().map(|a| a.device_index).collect();
        assert_eq!(indices.len(), 300);
        assert_eq!(attachments[299].device_index, 299);
    }
}
