//! Building blocks shared by several topologies.

use crate::error::Result;
use crate::resources::{
    IamRole, InstanceProfile, LogicalId, PolicyDocument, PolicyStatement, VpcEndpoint,
};
use crate::stack::Scope;

/// Principal trusted by instance roles.
pub const EC2_PRINCIPAL: &str = "ec2.amazonaws.com";

/// Name of the inline policy attached to instance roles.
pub const ROOT_POLICY: &str = "root";

/// Services reached through interface endpoints for Session Manager access,
/// with the local logical id each endpoint gets.
pub const SESSION_MANAGER_ENDPOINTS: [(&str, &str); 3] = [
    ("EC2MessagesInterfaceEndpoint", "ec2messages"),
    ("SSMMessagesInterfaceEndpoint", "ssmmessages"),
    ("SSMInterfaceEndpoint", "ssm"),
];

const SSM_ACTIONS: [&str; 15] = [
    "ssm:DescribeAssociation",
    "ssm:GetDeployablePatchSnapshotForInstance",
    "ssm:GetDocument",
    "ssm:DescribeDocument",
    "ssm:GetManifest",
    "ssm:GetParameter",
    "ssm:GetParameters",
    "ssm:ListAssociations",
    "ssm:ListInstanceAssociations",
    "ssm:PutInventory",
    "ssm:PutComplianceItems",
    "ssm:PutConfigurePackageResult",
    "ssm:UpdateAssociationStatus",
    "ssm:UpdateInstanceAssociationStatus",
    "ssm:UpdateInstanceInformation",
];

const SSM_MESSAGES_ACTIONS: [&str; 4] = [
    "ssmmessages:CreateControlChannel",
    "ssmmessages:CreateDataChannel",
    "ssmmessages:OpenControlChannel",
    "ssmmessages:OpenDataChannel",
];

const EC2_MESSAGES_ACTIONS: [&str; 6] = [
    "ec2messages:AcknowledgeMessage",
    "ec2messages:DeleteMessage",
    "ec2messages:FailMessage",
    "ec2messages:GetEndpoint",
    "ec2messages:GetMessages",
    "ec2messages:SendReply",
];

/// Policy letting an instance register with Systems Manager and reach
/// S3 and SNS.
pub fn session_manager_policy() -> PolicyDocument {
    PolicyDocument::new(vec![
        PolicyStatement::allow_all_resources(SSM_ACTIONS),
        PolicyStatement::allow_all_resources(SSM_MESSAGES_ACTIONS),
        PolicyStatement::allow_all_resources(EC2_MESSAGES_ACTIONS),
        PolicyStatement::allow_all_resources(["s3:*"]),
        PolicyStatement::allow_all_resources(["sns:*"]),
    ])
}

/// Policy allowing every action on every resource.
pub fn administrator_policy() -> PolicyDocument {
    PolicyDocument::new(vec![PolicyStatement::allow_all_resources(["*"])])
}

/// Ids of an instance role and the profile wrapping it.
#[derive(Debug, Clone)]
pub struct InstanceIdentity {
    /// The role
    pub role: LogicalId,
    /// The profile handed to instances
    pub profile: LogicalId,
}

/// Declare `EC2Role` and `EC2InstanceProfile` in `scope`.
pub fn instance_identity(
    scope: &mut Scope<'_>,
    role_name: &str,
    policy: PolicyDocument,
) -> Result<InstanceIdentity> {
    let role = scope.add(
        "EC2Role",
        IamRole::for_service(EC2_PRINCIPAL)
            .with_role_name(role_name)
            .with_inline_policy(ROOT_POLICY, policy),
    )?;
    let profile = scope.add("EC2InstanceProfile", InstanceProfile::new(&role))?;
    Ok(InstanceIdentity { role, profile })
}

/// Declare the Session Manager interface endpoints in `scope`.
pub fn session_manager_endpoints(
    scope: &mut Scope<'_>,
    vpc: &LogicalId,
    subnets: &[&LogicalId],
    security_group: &LogicalId,
) -> Result<Vec<LogicalId>> {
    SESSION_MANAGER_ENDPOINTS
        .iter()
        .map(|(local, service)| {
            scope.add(
                local,
                VpcEndpoint::interface(vpc, *service, subnets, &[security_group]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_manager_policy_is_scoped() {
        let policy = session_manager_policy();
        assert_eq!(policy.statements.len(), 5);
        assert!(policy.statements.iter().all(|s| !s.is_wildcard_allow()));
        assert_eq!(policy.statements[0].actions.len(), 15);
    }

    #[test]
    fn test_administrator_policy_is_wildcard() {
        assert!(administrator_policy().statements[0].is_wildcard_allow());
    }
}
