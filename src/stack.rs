//! Stacks: the unit of declaration and deployment.
//!
//! A [`Stack`] owns every resource declared in it, keyed by logical id, in
//! declaration order. A [`Scope`] is a borrowed view of a stack that prefixes
//! the ids it declares, so a builder can be reused under different prefixes.

use indexmap::{IndexMap, IndexSet};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::DeclarationGraph;
use crate::resources::{Declaration, LogicalId, MachineImage, Resource};
use crate::template::Template;
use crate::validate::{self, ValidationReport};

/// Value of a stack output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
    /// `{"Ref": id}`
    Ref(LogicalId),
    /// `{"Fn::GetAtt": [id, attribute]}`
    GetAtt(LogicalId, String),
}

impl OutputValue {
    /// Resource the value is read from.
    pub fn target(&self) -> &LogicalId {
        match self {
            OutputValue::Ref(id) | OutputValue::GetAtt(id, _) => id,
        }
    }

    /// Template expression.
    pub fn to_json(&self) -> Value {
        match self {
            OutputValue::Ref(id) => id.reference(),
            OutputValue::GetAtt(id, attribute) => id.get_att(attribute),
        }
    }
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Description
    pub description: String,
    /// Value
    pub value: OutputValue,
}

/// A named, region-bound collection of declarations.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    region: String,
    availability_zones: Vec<String>,
    description: Option<String>,
    resources: IndexMap<LogicalId, Resource>,
    dependencies: IndexSet<(LogicalId, LogicalId)>,
    outputs: IndexMap<LogicalId, Output>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            availability_zones: Vec::new(),
            description: None,
            resources: IndexMap::new(),
            dependencies: IndexSet::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Set the zones consumed positionally by builders.
    pub fn with_availability_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability_zones = zones.into_iter().map(Into::into).collect();
        self
    }

    /// Set the template description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Template description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Configured zones.
    pub fn availability_zones(&self) -> &[String] {
        &self.availability_zones
    }

    /// Zone at `index`.
    pub fn availability_zone(&self, index: usize) -> Result<&str> {
        self.availability_zones
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingAvailabilityZone {
                stack: self.name.clone(),
                index,
                available: self.availability_zones.len(),
            })
    }

    /// Declare a resource under `id`.
    pub fn add<R>(&mut self, id: &str, resource: R) -> Result<LogicalId>
    where
        R: Declaration + Into<Resource>,
    {
        let id = LogicalId::new(id)?;
        if self.resources.contains_key(&id) {
            return Err(Error::DuplicateLogicalId {
                stack: self.name.clone(),
                id: id.to_string(),
            });
        }
        debug!(stack = %self.name, id = %id, kind = %R::KIND, "declared resource");
        self.resources.insert(id.clone(), resource.into());
        Ok(id)
    }

    /// Require `dependency` to be provisioned before `dependent`.
    pub fn add_dependency(&mut self, dependent: &LogicalId, dependency: &LogicalId) -> Result<()> {
        for id in [dependent, dependency] {
            if !self.resources.contains_key(id) {
                return Err(Error::unknown_resource(&self.name, id.as_str()));
            }
        }
        if dependent == dependency {
            return Err(Error::SelfDependency(dependent.to_string()));
        }
        debug!(stack = %self.name, dependent = %dependent, dependency = %dependency, "declared dependency");
        self.dependencies.insert((dependent.clone(), dependency.clone()));
        Ok(())
    }

    /// Declare an output.
    pub fn add_output(
        &mut self,
        id: &str,
        description: impl Into<String>,
        value: OutputValue,
    ) -> Result<LogicalId> {
        let id = LogicalId::new(id)?;
        if !self.resources.contains_key(value.target()) {
            return Err(Error::unknown_resource(&self.name, value.target().as_str()));
        }
        if self.outputs.contains_key(&id) {
            return Err(Error::DuplicateLogicalId {
                stack: self.name.clone(),
                id: id.to_string(),
            });
        }
        self.outputs.insert(
            id.clone(),
            Output {
                description: description.into(),
                value,
            },
        );
        Ok(id)
    }

    /// A view that prefixes declared ids with `prefix`.
    pub fn scope(&mut self, prefix: impl Into<String>) -> Scope<'_> {
        Scope {
            stack: self,
            prefix: prefix.into(),
        }
    }

    /// Look up a resource.
    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Whether `id` is declared.
    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &Resource)> {
        self.resources.iter()
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Explicit edges as `(dependent, dependency)` pairs.
    pub fn dependencies(&self) -> impl Iterator<Item = (&LogicalId, &LogicalId)> {
        self.dependencies.iter().map(|(a, b)| (a, b))
    }

    /// Explicit dependencies of `id`, sorted.
    pub fn depends_on(&self, id: &LogicalId) -> Vec<&LogicalId> {
        let mut deps: Vec<&LogicalId> = self
            .dependencies
            .iter()
            .filter(|(dependent, _)| dependent == id)
            .map(|(_, dependency)| dependency)
            .collect();
        deps.sort();
        deps
    }

    /// Outputs in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&LogicalId, &Output)> {
        self.outputs.iter()
    }

    /// Template parameters implied by the declarations: one per SSM image path.
    pub fn parameters(&self) -> IndexMap<String, Value> {
        let mut params = IndexMap::new();
        for (_, resource) in &self.resources {
            let Resource::Instance(instance) = resource else {
                continue;
            };
            if let (MachineImage::SsmParameter(path), Some(param_id)) =
                (&instance.image, instance.image.parameter_id())
            {
                params.entry(param_id).or_insert_with(|| {
                    json!({
                        "Type": "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>",
                        "Default": path,
                    })
                });
            }
        }
        params
    }

    /// Build the declaration graph.
    pub fn graph(&self) -> DeclarationGraph {
        DeclarationGraph::from_stack(self)
    }

    /// Run structural validation.
    pub fn validate(&self) -> ValidationReport {
        validate::validate(self)
    }

    /// Validate, then render the template.
    ///
    /// Fails with [`Error::Validation`] if the report holds any error;
    /// warnings are logged and do not block synthesis.
    pub fn synthesize(&self) -> Result<Template> {
        let report = self.validate();
        for violation in report.warnings() {
            warn!(stack = %self.name, "{}", violation);
        }
        if report.has_errors() {
            return Err(Error::Validation {
                stack: self.name.clone(),
                report,
            });
        }
        let template = Template::from_stack(self);
        info!(
            stack = %self.name,
            resources = self.resources.len(),
            "synthesized template"
        );
        Ok(template)
    }
}

/// A stack view that prefixes logical ids.
#[derive(Debug)]
pub struct Scope<'s> {
    stack: &'s mut Stack,
    prefix: String,
}

impl<'s> Scope<'s> {
    /// The id `local` would get in this scope.
    pub fn qualify(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    /// Declare a resource under the prefixed id.
    pub fn add<R>(&mut self, local: &str, resource: R) -> Result<LogicalId>
    where
        R: Declaration + Into<Resource>,
    {
        let id = self.qualify(local);
        self.stack.add(&id, resource)
    }

    /// Require `dependency` before `dependent`.
    pub fn add_dependency(&mut self, dependent: &LogicalId, dependency: &LogicalId) -> Result<()> {
        self.stack.add_dependency(dependent, dependency)
    }

    /// Declare an output under the prefixed id.
    pub fn add_output(
        &mut self,
        local: &str,
        description: impl Into<String>,
        value: OutputValue,
    ) -> Result<LogicalId> {
        let id = self.qualify(local);
        self.stack.add_output(&id, description, value)
    }

    /// Zone at `index` of the underlying stack.
    pub fn availability_zone(&self, index: usize) -> Result<String> {
        self.stack.availability_zone(index).map(str::to_string)
    }

    /// The underlying stack.
    pub fn stack(&self) -> &Stack {
        self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cidr::Cidr;
    use crate::resources::{InternetGateway, Subnet, Vpc};

    fn stack() -> Stack {
        Stack::new("demo", "us-east-1").with_availability_zones(["us-east-1a", "us-east-1b"])
    }

    fn vpc() -> Vpc {
        Vpc::new(Cidr::parse("10.16.0.0/16").unwrap())
    }

    #[test]
    fn test_duplicate_logical_id() {
        let mut stack = stack();
        stack.add("Vpc", vpc()).unwrap();
        let err = stack.add("Vpc", vpc()).unwrap_err();
        assert!(matches!(err, Error::DuplicateLogicalId { ref id, .. } if id == "Vpc"));
    }

    #[test]
    fn test_invalid_logical_id() {
        let mut stack = stack();
        assert!(matches!(
            stack.add("my-vpc", vpc()),
            Err(Error::InvalidLogicalId { .. })
        ));
    }

    #[test]
    fn test_scope_prefixes_ids() {
        let mut stack = stack();
        let mut scope = stack.scope("Aws");
        let id = scope.add("Vpc", vpc()).unwrap();
        assert_eq!(id.as_str(), "AwsVpc");
        assert!(stack.contains("AwsVpc"));
        assert!(!stack.contains("Vpc"));
    }

    #[test]
    fn test_dependency_errors() {
        let mut stack = stack();
        let vpc_id = stack.add("Vpc", vpc()).unwrap();
        let igw = stack.add("Igw", InternetGateway::new()).unwrap();
        let ghost = LogicalId::new("Ghost").unwrap();

        assert!(matches!(
            stack.add_dependency(&vpc_id, &ghost),
            Err(Error::UnknownResource { .. })
        ));
        assert!(matches!(
            stack.add_dependency(&vpc_id, &vpc_id),
            Err(Error::SelfDependency(_))
        ));
        stack.add_dependency(&igw, &vpc_id).unwrap();
        stack.add_dependency(&igw, &vpc_id).unwrap();
        assert_eq!(stack.dependencies().count(), 1);
        assert_eq!(stack.depends_on(&igw), vec![&vpc_id]);
    }

    #[test]
    fn test_availability_zone_lookup() {
        let stack = stack();
        assert_eq!(stack.availability_zone(1).unwrap(), "us-east-1b");
        assert!(matches!(
            stack.availability_zone(2),
            Err(Error::MissingAvailabilityZone { index: 2, available: 2, .. })
        ));
    }

    #[test]
    fn test_output_requires_target() {
        let mut stack = stack();
        let ghost = LogicalId::new("Ghost").unwrap();
        assert!(stack
            .add_output("GhostIp", "nothing", OutputValue::Ref(ghost))
            .is_err());

        let vpc_id = stack.add("Vpc", vpc()).unwrap();
        stack
            .add_output("VpcId", "network id", OutputValue::Ref(vpc_id))
            .unwrap();
        assert_eq!(stack.outputs().count(), 1);
    }

    #[test]
    fn test_subnet_synthesizes() {
        let mut stack = stack();
        let vpc_id = stack.add("Vpc", vpc()).unwrap();
        let zone = stack.availability_zone(0).unwrap().to_string();
        stack
            .add("Subnet", Subnet::new(&vpc_id, Cidr::parse("10.16.32.0/20").unwrap(), zone))
            .unwrap();
        // An unassociated subnet is a validation error.
        assert!(matches!(stack.synthesize(), Err(Error::Validation { .. })));
    }
}
