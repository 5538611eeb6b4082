//! CloudFormation template rendering.
//!
//! Key order is part of the output contract: resources and outputs appear in
//! declaration order, `DependsOn` lists are sorted, so the same stack always
//! renders to the same bytes.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::stack::Stack;

/// Template format version.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// One entry of the `Resources` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    /// CloudFormation type
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Properties block
    pub properties: Map<String, Value>,
    /// Explicit ordering edges
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// One entry of the `Outputs` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    /// Description
    pub description: String,
    /// Value expression
    pub value: Value,
}

/// A synthesized template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    /// Format version
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Description
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deploy-time parameters
    #[serde(rename = "Parameters", skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,
    /// Resources by logical id
    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, TemplateResource>,
    /// Outputs by logical id
    #[serde(rename = "Outputs", skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, TemplateOutput>,
}

impl Template {
    /// Render a stack without validating it.
    ///
    /// Use [`Stack::synthesize`] for the validated path.
    pub fn from_stack(stack: &Stack) -> Self {
        let resources = stack
            .resources()
            .map(|(id, resource)| {
                let entry = TemplateResource {
                    resource_type: resource.kind().cfn_type().to_string(),
                    properties: resource.properties(),
                    depends_on: stack.depends_on(id).into_iter().map(ToString::to_string).collect(),
                };
                (id.to_string(), entry)
            })
            .collect();

        let outputs = stack
            .outputs()
            .map(|(id, output)| {
                let entry = TemplateOutput {
                    description: output.description.clone(),
                    value: output.value.to_json(),
                };
                (id.to_string(), entry)
            })
            .collect();

        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: stack.description().map(str::to_string),
            parameters: stack.parameters(),
            resources,
            outputs,
        }
    }

    /// Look up a resource entry.
    pub fn resource(&self, id: &str) -> Option<&TemplateResource> {
        self.resources.get(id)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
