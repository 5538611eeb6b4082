//! Application: the set of stacks synthesized together.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, ErrorContext, Result};
use crate::stack::Stack;
use crate::template::Template;

/// Name of the manifest written next to the templates.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest entry for one synthesized stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Target region
    pub region: String,
    /// Template file name, relative to the manifest
    pub template_file: String,
    /// Number of resources in the template
    pub resources: usize,
}

/// Description of one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: String,
    /// Synthesized stacks by name
    pub stacks: IndexMap<String, ManifestEntry>,
}

/// Registered stacks, keyed by unique name.
#[derive(Debug, Default)]
pub struct App {
    stacks: IndexMap<String, Stack>,
}

impl App {
    /// Create an empty application.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stack.
    pub fn register(&mut self, stack: Stack) -> Result<()> {
        validate_stack_name(stack.name())?;
        if self.stacks.contains_key(stack.name()) {
            return Err(Error::DuplicateStack(stack.name().to_string()));
        }
        debug!(stack = %stack.name(), region = %stack.region(), "registered stack");
        self.stacks.insert(stack.name().to_string(), stack);
        Ok(())
    }

    /// Look up a stack by name.
    pub fn get(&self, name: &str) -> Result<&Stack> {
        self.stacks
            .get(name)
            .ok_or_else(|| Error::StackNotFound(name.to_string()))
    }

    /// Registered stacks in registration order.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Stack names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.stacks.keys().map(String::as_str).collect()
    }

    /// Select stacks by name; an empty selection means every stack.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Stack>> {
        if names.is_empty() {
            return Ok(self.stacks.values().collect());
        }
        names.iter().map(|name| self.get(name)).collect()
    }

    /// Validate and render every selected stack without writing anything.
    pub fn synthesize(&self, names: &[String]) -> Result<Vec<(&Stack, Template)>> {
        self.select(names)?
            .into_iter()
            .map(|stack| stack.synthesize().map(|template| (stack, template)))
            .collect()
    }

    /// Synthesize the selected stacks into `out_dir`.
    ///
    /// Every stack is validated before the first file is written, so a
    /// failing stack leaves the directory untouched.
    pub fn synth(&self, names: &[String], out_dir: &Path) -> Result<Manifest> {
        let rendered = self.synthesize(names)?;

        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let mut manifest = Manifest {
            version: "1".to_string(),
            stacks: IndexMap::new(),
        };
        for (stack, template) in rendered {
            let file_name = template_file_name(stack.name());
            let path = out_dir.join(&file_name);
            fs::write(&path, template.to_json_pretty()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(stack = %stack.name(), path = %path.display(), "wrote template");

            manifest.stacks.insert(
                stack.name().to_string(),
                ManifestEntry {
                    region: stack.region().to_string(),
                    template_file: file_name,
                    resources: template.resources.len(),
                },
            );
        }

        let manifest_path = out_dir.join(MANIFEST_FILE);
        let mut json = serde_json::to_string_pretty(&manifest)?;
        json.push('\n');
        fs::write(&manifest_path, json)
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        Ok(manifest)
    }
}

/// `<stack>.template.json`
pub fn template_file_name(stack: &str) -> String {
    format!("{}.template.json", stack)
}

/// Path of a stack's template inside `out_dir`.
pub fn template_path(out_dir: &Path, stack: &str) -> PathBuf {
    out_dir.join(template_file_name(stack))
}

fn validate_stack_name(name: &str) -> Result<()> {
    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let allowed = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !starts_with_letter || !allowed || name.len() > 128 {
        return Err(Error::invalid_config(
            "stack name",
            format!(
                "'{}' must start with a letter and contain only letters, digits and hyphens (max 128)",
                name
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_stack_rejected() {
        let mut app = App::new();
        app.register(Stack::new("demo", "us-east-1")).unwrap();
        let err = app.register(Stack::new("demo", "eu-west-1")).unwrap_err();
        assert!(matches!(err, Error::DuplicateStack(ref name) if name == "demo"));
    }

    #[test]
    fn test_stack_name_rules() {
        let mut app = App::new();
        assert!(app.register(Stack::new("site-to-site-vpn", "us-east-1")).is_ok());
        assert!(app.register(Stack::new("1st", "us-east-1")).is_err());
        assert!(app.register(Stack::new("has_underscore", "us-east-1")).is_err());
        assert!(app.register(Stack::new("", "us-east-1")).is_err());
    }

    #[test]
    fn test_select() {
        let mut app = App::new();
        app.register(Stack::new("a", "us-east-1")).unwrap();
        app.register(Stack::new("b", "us-east-1")).unwrap();
        assert_eq!(app.select(&[]).unwrap().len(), 2);
        assert_eq!(app.select(&["b".to_string()]).unwrap()[0].name(), "b");
        assert!(matches!(
            app.select(&["c".to_string()]),
            Err(Error::StackNotFound(_))
        ));
    }

    #[test]
    fn test_template_file_name() {
        assert_eq!(template_file_name("hybrid"), "hybrid.template.json");
        assert_eq!(
            template_path(Path::new("out"), "hybrid"),
            PathBuf::from("out/hybrid.template.json")
        );
    }
}
