//! IAM roles, inline policies and instance profiles.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{Declaration, LogicalId, Properties, Reference, ResourceKind};

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grant
    Allow,
    /// Explicit denial
    Deny,
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Actions, e.g. `ssm:GetParameter`
    #[serde(rename = "Action", serialize_with = "one_or_many")]
    pub actions: Vec<String>,
    /// Allow or deny
    pub effect: Effect,
    /// Resource ARNs
    #[serde(rename = "Resource", serialize_with = "one_or_many")]
    pub resources: Vec<String>,
}

fn one_or_many<S: serde::Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    match values {
        [single] => serializer.serialize_str(single),
        many => many.serialize(serializer),
    }
}

impl PolicyStatement {
    /// Allow `actions` on every resource.
    pub fn allow_all_resources<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            effect: Effect::Allow,
            resources: vec!["*".to_string()],
        }
    }

    /// Whether this grants every action on every resource.
    pub fn is_wildcard_allow(&self) -> bool {
        self.effect == Effect::Allow
            && self.actions.iter().any(|a| a == "*")
            && self.resources.iter().any(|r| r == "*")
    }
}

/// A policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    /// Statements
    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Create a document from statements.
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self { statements }
    }

    /// Synthesized form, with the policy language version.
    pub fn to_json(&self) -> Value {
        json!({
            "Statement": self.statements,
            "Version": "2012-10-17",
        })
    }
}

/// A role assumed by a service principal.
#[derive(Debug, Clone, PartialEq)]
pub struct IamRole {
    /// Service allowed to assume the role
    pub assumed_by: String,
    /// Role path
    pub path: String,
    /// Role name
    pub role_name: Option<String>,
    /// Inline policies by name
    pub inline_policies: IndexMap<String, PolicyDocument>,
}

impl IamRole {
    /// A role assumable by `service`, e.g. `ec2.amazonaws.com`.
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            assumed_by: service.into(),
            path: "/".to_string(),
            role_name: None,
            inline_policies: IndexMap::new(),
        }
    }

    /// Set the role name.
    pub fn with_role_name(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    /// Add an inline policy.
    pub fn with_inline_policy(mut self, name: impl Into<String>, document: PolicyDocument) -> Self {
        self.inline_policies.insert(name.into(), document);
        self
    }

    /// Every statement across all inline policies.
    pub fn statements(&self) -> impl Iterator<Item = &PolicyStatement> {
        self.inline_policies.values().flat_map(|d| d.statements.iter())
    }
}

impl Declaration for IamRole {
    const KIND: ResourceKind = ResourceKind::IamRole;

    fn properties(&self) -> Map<String, Value> {
        let trust = json!({
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": self.assumed_by },
            }],
            "Version": "2012-10-17",
        });
        let policies: Vec<Value> = self
            .inline_policies
            .iter()
            .map(|(name, doc)| json!({ "PolicyDocument": doc.to_json(), "PolicyName": name }))
            .collect();

        let mut props = Properties::new()
            .set("AssumeRolePolicyDocument", trust)
            .set("Path", self.path.as_str());
        if !policies.is_empty() {
            props = props.set("Policies", policies);
        }
        props.set_opt("RoleName", self.role_name.as_deref()).build()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// Makes a role available to instances.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceProfile {
    /// Roles carried by the profile
    pub roles: Vec<LogicalId>,
    /// Profile path
    pub path: String,
}

impl InstanceProfile {
    /// A profile carrying one role.
    pub fn new(role: &LogicalId) -> Self {
        Self {
            roles: vec![role.clone()],
            path: "/".to_string(),
        }
    }
}

impl Declaration for InstanceProfile {
    const KIND: ResourceKind = ResourceKind::InstanceProfile;

    fn properties(&self) -> Map<String, Value> {
        let roles: Vec<Value> = self.roles.iter().map(LogicalId::reference).collect();
        Properties::new()
            .set("Path", self.path.as_str())
            .set("Roles", roles)
            .build()
    }

    fn references(&self) -> Vec<Reference> {
        self.roles
            .iter()
            .map(|r| Reference::new("Roles", r, &[ResourceKind::IamRole]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_serialization() {
        let single = PolicyStatement::allow_all_resources(["s3:*"]);
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({ "Action": "s3:*", "Effect": "Allow", "Resource": "*" })
        );
        let many = PolicyStatement::allow_all_resources(["ssm:GetDocument", "ssm:GetManifest"]);
        assert_eq!(
            serde_json::to_value(&many).unwrap()["Action"],
            json!(["ssm:GetDocument", "ssm:GetManifest"])
        );
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(PolicyStatement::allow_all_resources(["*"]).is_wildcard_allow());
        assert!(!PolicyStatement::allow_all_resources(["s3:*"]).is_wildcard_allow());
        let mut deny = PolicyStatement::allow_all_resources(["*"]);
        deny.effect = Effect::Deny;
        assert!(!deny.is_wildcard_allow());
    }

    #[test]
    fn test_role_properties() {
        let role = IamRole::for_service("ec2.amazonaws.com")
            .with_role_name("demo-role")
            .with_inline_policy(
                "root",
                PolicyDocument::new(vec![PolicyStatement::allow_all_resources(["sns:*"])]),
            );
        let props = role.properties();
        assert_eq!(
            props["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            json!("ec2.amazonaws.com")
        );
        assert_eq!(props["Policies"][0]["PolicyName"], json!("root"));
        assert_eq!(props["Policies"][0]["PolicyDocument"]["Version"], json!("2012-10-17"));
        assert_eq!(props["RoleName"], json!("demo-role"));
        assert_eq!(role.statements().count(), 1);
    }

    #[test]
    fn test_profile_references_role() {
        let role = LogicalId::new("Role").unwrap();
        let profile = InstanceProfile::new(&role);
        assert_eq!(profile.properties()["Roles"], json!([{ "Ref": "Role" }]));
        assert!(profile.references()[0].accepts(ResourceKind::IamRole));
    }
}
