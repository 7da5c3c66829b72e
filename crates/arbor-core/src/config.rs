//! Configuration loading and typed config structures for Arbor.
//!
//! The configuration lives in `arbor-config.yaml`. Every field has a
//! default, so an empty file (or none at all) yields a runnable demo
//! world with two zones.

use std::path::Path;

use arbor_tree::{AiRegistry, BehaviorTree, TreeError, TreeNode};
use arbor_types::NodeId;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A configured behavior tree is invalid.
    #[error("invalid behaviour for zone '{zone}': {source}")]
    Behaviour {
        /// The zone whose tree failed to build.
        zone: String,
        /// The underlying tree error.
        source: TreeError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Arbor configuration, mirroring `arbor-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArborConfig {
    /// Simulation timing and seeding.
    #[serde(default)]
    pub world: WorldConfig,

    /// Debugger transport settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Zones to create at startup.
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
}

impl Default for ArborConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            zones: default_zones(),
        }
    }
}

impl ArborConfig {
    /// Load configuration from a YAML file.
    ///
    /// `ARBOR_HOST` and `ARBOR_PORT` override the server address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides();
        Ok(config)
    }

    /// Check that every configured behaviour builds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Behaviour`] for the first zone whose tree
    /// does not build with `registry`.
    pub fn validate(&self, registry: &AiRegistry) -> Result<(), ConfigError> {
        for zone in &self.zones {
            zone.behaviour
                .build(registry)
                .map_err(|source| ConfigError::Behaviour {
                    zone: zone.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Simulation timing and seeding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real and simulated milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Debugger transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Capacity of the broadcast channel feeding WebSocket clients.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl ServerConfig {
    /// Override the bind address with `ARBOR_HOST` / `ARBOR_PORT` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ARBOR_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("ARBOR_PORT")
            && let Ok(port) = val.parse()
        {
            self.port = port;
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// One zone created at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    /// Zone name.
    pub name: String,

    /// Number of agents to spawn.
    #[serde(default = "default_agents")]
    pub agents: u32,

    /// Aggro lost per entry per second.
    #[serde(default = "default_aggro_decay")]
    pub aggro_decay_per_second: f32,

    /// Behavior tree every agent of the zone starts with.
    pub behaviour: TreeConfig,
}

/// A behavior tree written out as nested nodes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeConfig {
    /// Display name.
    pub name: String,

    /// Node type expression, e.g. `Idle{500}`.
    pub node_type: String,

    /// Optional condition expression.
    #[serde(default)]
    pub condition: Option<String>,

    /// Children in execution order.
    #[serde(default)]
    pub children: Vec<TreeConfig>,
}

impl TreeConfig {
    /// Build the tree, numbering nodes from 1 in pre-order.
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeError`] hit while parsing expressions or
    /// attaching children.
    pub fn build(&self, registry: &AiRegistry) -> Result<BehaviorTree, TreeError> {
        let mut next = NodeId::new(1);
        let root = self.build_node(registry, &mut next)?;
        Ok(BehaviorTree::new(root))
    }

    fn build_node(&self, registry: &AiRegistry, next: &mut NodeId) -> Result<TreeNode, TreeError> {
        let id = *next;
        *next = id.next().ok_or(TreeError::IdSpaceExhausted)?;
        let mut node = registry.parse_node(&self.node_type, &self.name, id)?;
        if let Some(expression) = &self.condition {
            node.set_condition(Some(registry.parse_condition(expression)?));
        }
        for child in &self.children {
            node.add_child(child.build_node(registry, next)?)?;
        }
        Ok(node)
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Arbor Sandbox".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    100
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    12345
}

const fn default_broadcast_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_agents() -> u32 {
    3
}

const fn default_aggro_decay() -> f32 {
    1.0
}

fn leaf(name: &str, node_type: &str, condition: Option<&str>) -> TreeConfig {
    TreeConfig {
        name: name.to_owned(),
        node_type: node_type.to_owned(),
        condition: condition.map(str::to_owned),
        children: Vec::new(),
    }
}

fn default_behaviour() -> TreeConfig {
    TreeConfig {
        name: "root".to_owned(),
        node_type: "PrioritySelector".to_owned(),
        condition: None,
        children: vec![
            TreeConfig {
                name: "engage".to_owned(),
                node_type: "Sequence".to_owned(),
                condition: Some("HasEnemies{1}".to_owned()),
                children: vec![
                    leaf("taunt", "Idle{500}", None),
                    leaf("chase", "Wander{3.0}", None),
                ],
            },
            leaf("roam", "Wander{1.0}", Some("Random{0.8}")),
            leaf("rest", "Idle{1000}", None),
        ],
    }
}

fn default_zones() -> Vec<ZoneConfig> {
    vec![
        ZoneConfig {
            name: "alpha".to_owned(),
            agents: 3,
            aggro_decay_per_second: default_aggro_decay(),
            behaviour: default_behaviour(),
        },
        ZoneConfig {
            name: "beta".to_owned(),
            agents: 2,
            aggro_decay_per_second: default_aggro_decay(),
            behaviour: default_behaviour(),
        },
    ]
}
