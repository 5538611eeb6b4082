//! Configuration module for vpc-topologies
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.vpc-topologies.toml)
//! - Project configuration (./vpc-topologies.toml)
//! - Environment variables
//! - Command-line arguments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app::App;
use crate::error::{Error, ErrorContext, Result};
use crate::topologies::{
    default_availability_zones, HybridCidrs, PrivateAccessCidrs, PrivateAccessOptions,
    StackSettings, Topology, DEFAULT_REGION,
};

/// Configuration file name looked up in the project and home directories.
pub const CONFIG_FILE: &str = "vpc-topologies.toml";

/// Default synthesis output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "cdk.out";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Per-topology stack settings
    pub stacks: StacksConfig,

    /// Address plan of the hybrid and site-to-site VPN topologies
    pub hybrid_cidrs: HybridCidrs,

    /// Address plan of the private access topology
    pub private_access_cidrs: PrivateAccessCidrs,

    /// Private access options
    pub private_access: PrivateAccessOptions,

    /// Output settings
    pub output: OutputConfig,
}

/// Default configuration values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Target region
    pub region: String,

    /// Availability zones; derived from the region when empty
    pub availability_zones: Vec<String>,

    /// Directory templates are written to
    pub output_dir: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            availability_zones: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Settings of every topology's stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StacksConfig {
    /// Hybrid architecture
    pub hybrid: StackConfig,
    /// Site-to-site VPN
    pub site_to_site_vpn: StackConfig,
    /// Private access
    pub private_access: StackConfig,
}

impl StacksConfig {
    /// Settings for `topology`.
    pub fn get(&self, topology: Topology) -> &StackConfig {
        match topology {
            Topology::Hybrid => &self.hybrid,
            Topology::SiteToSiteVpn => &self.site_to_site_vpn,
            Topology::PrivateAccess => &self.private_access,
        }
    }
}

/// Settings of one stack; unset values fall back to [`Defaults`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Register the stack
    pub enabled: bool,

    /// Stack name
    pub stack_name: Option<String>,

    /// Target region
    pub region: Option<String>,

    /// Availability zones
    pub availability_zones: Vec<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stack_name: None,
            region: None,
            availability_zones: Vec::new(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colorize human output
    pub color: bool,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            pretty: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Files are layered key by key: a later file only replaces the values
    /// it sets, tables are merged recursively.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
        }

        let mut layered = Value::Object(Map::new());
        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                debug!(path = %path.display(), "loading configuration");
                merge_layer(&mut layered, Self::read_layer(&path)?);
            }
        }

        let mut config = Self::from_layer(layered)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest precedence first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        if let Ok(env_config) = std::env::var("VPC_TOPOLOGIES_CONFIG") {
            return vec![PathBuf::from(env_config)];
        }

        let mut paths = Vec::new();

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_FILE)));
        }

        // Project config (current directory)
        paths.push(PathBuf::from(CONFIG_FILE));

        paths
    }

    /// Read one file into an untyped layer, checked against the schema.
    fn read_layer(path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let layer: Value = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| {
                    Error::Config(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?,
        };

        // An empty YAML document
        let layer = if layer.is_null() {
            Value::Object(Map::new())
        } else {
            layer
        };
        if !layer.is_object() {
            return Err(Error::Config(format!(
                "Config file {} must contain a table of settings",
                path.display()
            )));
        }

        // Type errors name the file they come from
        serde_json::from_value::<Config>(layer.clone()).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        Ok(layer)
    }

    fn from_layer(layer: Value) -> Result<Self> {
        serde_json::from_value(layer)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // VPC_TOPOLOGIES_REGION
        if let Ok(region) = std::env::var("VPC_TOPOLOGIES_REGION") {
            self.defaults.region = region;
        }

        // VPC_TOPOLOGIES_AVAILABILITY_ZONES (comma separated)
        if let Ok(zones) = std::env::var("VPC_TOPOLOGIES_AVAILABILITY_ZONES") {
            self.defaults.availability_zones = zones
                .split(',')
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .map(String::from)
                .collect();
        }

        // VPC_TOPOLOGIES_OUTPUT_DIR
        if let Ok(dir) = std::env::var("VPC_TOPOLOGIES_OUTPUT_DIR") {
            self.defaults.output_dir = PathBuf::from(dir);
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = false;
        }
    }

    /// Resolve the settings `topology` is built with.
    pub fn settings_for(&self, topology: Topology) -> StackSettings {
        let stack = self.stacks.get(topology);
        let region = stack
            .region
            .clone()
            .unwrap_or_else(|| self.defaults.region.clone());

        let availability_zones = if !stack.availability_zones.is_empty() {
            stack.availability_zones.clone()
        } else if !self.defaults.availability_zones.is_empty() && stack.region.is_none() {
            self.defaults.availability_zones.clone()
        } else {
            default_availability_zones(&region)
        };

        StackSettings {
            stack_name: stack
                .stack_name
                .clone()
                .unwrap_or_else(|| topology.default_stack_name().to_string()),
            region,
            availability_zones,
            hybrid_cidrs: self.hybrid_cidrs.clone(),
            private_access_cidrs: self.private_access_cidrs.clone(),
            private_access: self.private_access.clone(),
        }
    }

    /// Enabled topologies, in registration order.
    pub fn enabled_topologies(&self) -> Vec<Topology> {
        Topology::ALL
            .into_iter()
            .filter(|t| self.stacks.get(*t).enabled)
            .collect()
    }

    /// Declare every enabled topology and register it.
    pub fn build_app(&self) -> Result<App> {
        let mut app = App::new();
        for topology in self.enabled_topologies() {
            let stack = topology.build(&self.settings_for(topology))?;
            debug!(topology = %topology, stack = %stack.name(), resources = stack.len(), "built topology");
            app.register(stack)?;
        }
        Ok(app)
    }

    /// Get the effective output directory
    pub fn output_dir(&self) -> &Path {
        &self.defaults.output_dir
    }

    /// Load from a specific file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_layer(Self::read_layer(path.as_ref())?)
    }
}

/// Merge `layer` into `base`: tables recursively, everything else replaced.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_layer(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.region, "us-east-1");
        assert_eq!(config.output_dir(), Path::new("cdk.out"));
        assert!(config.output.color);
        assert_eq!(config.enabled_topologies().len(), 3);
    }

    #[test]
    fn test_layers_merge_key_by_key() {
        let mut base = serde_json::json!({
            "defaults": { "region": "eu-west-1" },
            "stacks": { "hybrid": { "enabled": false, "stack_name": "lab" } },
            "hybrid_cidrs": { "onprem_vpc": "192.168.0.0/21" },
        });
        merge_layer(
            &mut base,
            serde_json::json!({
                "defaults": { "output_dir": "build" },
                "stacks": { "hybrid": { "stack_name": "lab-2" } },
                "hybrid_cidrs": { "aws_vpc": "10.32.0.0/16" },
            }),
        );

        let merged = Config::from_layer(base).unwrap();
        assert_eq!(merged.defaults.region, "eu-west-1");
        assert_eq!(merged.output_dir(), Path::new("build"));
        assert!(!merged.stacks.hybrid.enabled);
        assert_eq!(merged.stacks.hybrid.stack_name.as_deref(), Some("lab-2"));
        assert_eq!(merged.hybrid_cidrs.onprem_vpc, "192.168.0.0/21");
        assert_eq!(merged.hybrid_cidrs.aws_vpc, "10.32.0.0/16");
    }

    #[test]
    fn test_later_layer_can_restore_default_value() {
        let mut base = serde_json::json!({ "defaults": { "region": "eu-west-1" } });
        merge_layer(&mut base, serde_json::json!({ "defaults": { "region": "us-east-1" } }));
        assert_eq!(Config::from_layer(base).unwrap().defaults.region, "us-east-1");
    }

    #[test]
    fn test_type_error_names_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[stacks.hybrid]\nenabled = \"sometimes\"").unwrap();
        match Config::from_file(file.path()) {
            Err(Error::Config(message)) => {
                assert!(message.contains(&file.path().display().to_string()));
            }
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("VPC_TOPOLOGIES_OUTPUT_DIR", "/tmp/templates");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.output_dir(), Path::new("/tmp/templates"));
        std::env::remove_var("VPC_TOPOLOGIES_OUTPUT_DIR");
    }

    #[test]
    fn test_settings_resolution() {
        let config = Config {
            stacks: StacksConfig {
                private_access: StackConfig {
                    region: Some("ap-southeast-2".to_string()),
                    ..StackConfig::default()
                },
                ..StacksConfig::default()
            },
            ..Config::default()
        };

        let settings = config.settings_for(Topology::PrivateAccess);
        assert_eq!(settings.stack_name, "private-access-demo");
        assert_eq!(settings.region, "ap-southeast-2");
        assert_eq!(settings.availability_zones[0], "ap-southeast-2a");

        let settings = config.settings_for(Topology::Hybrid);
        assert_eq!(settings.region, "us-east-1");
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[defaults]
region = "eu-central-1"

[stacks.site_to_site_vpn]
enabled = false

[hybrid_cidrs]
onprem_vpc = "192.168.0.0/21"

[private_access]
ssh_ingress = "203.0.113.0/24"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.defaults.region, "eu-central-1");
        assert_eq!(
            config.enabled_topologies(),
            vec![Topology::Hybrid, Topology::PrivateAccess]
        );
        assert_eq!(config.hybrid_cidrs.onprem_vpc, "192.168.0.0/21");
        assert_eq!(config.hybrid_cidrs.aws_vpc, "10.16.0.0/16");
        assert!(config.private_access.permissive_role);
        assert_eq!(
            config.private_access.ssh_ingress.as_deref(),
            Some("203.0.113.0/24")
        );
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "output:\n  color: false\n").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.output.color);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[defaults\nregion = ").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::TomlParse(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = PathBuf::from("/nonexistent/vpc-topologies.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(Error::FileNotFound(_))
        ));
    }
}
