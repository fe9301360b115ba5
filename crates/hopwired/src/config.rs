use anyhow::{Context, Result};
use hopwire_controller::{MacAging, RuleDefaults, DEFAULT_EVENT_QUEUE_CAPACITY};
use hopwire_protocol::DEFAULT_FLOW_PRIORITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub controller: ControllerConfig,
    pub flow: FlowConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,

    #[serde(skip)]
    config_file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Capacity of the inbound event queue
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
    /// Periodic MAC cache expiry; disabled when absent
    #[serde(default)]
    pub mac_aging: Option<MacAging>,
}

fn default_event_queue_capacity() -> usize {
    DEFAULT_EVENT_QUEUE_CAPACITY
}

/// Parameters of installed flow rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub priority: u16,
    pub idle_timeout_secs: u16,
    pub hard_timeout_secs: u16,
    #[serde(default)]
    pub cookie: u64,
    #[serde(default = "default_send_flow_removed")]
    pub send_flow_removed: bool,
}

fn default_send_flow_removed() -> bool {
    true
}

impl FlowConfig {
    pub fn rule_defaults(&self) -> RuleDefaults {
        RuleDefaults {
            priority: self.priority,
            idle_timeout: self.idle_timeout_secs,
            hard_timeout: self.hard_timeout_secs,
            cookie: self.cookie,
            send_flow_removed: self.send_flow_removed,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_FLOW_PRIORITY,
            idle_timeout_secs: 0,
            hard_timeout_secs: 0,
            cookie: 0,
            send_flow_removed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario file replayed at startup; the built-in tree network is used when unset
    pub path: Option<PathBuf>,
    /// Keep running after the scenario is exhausted until Ctrl+C
    #[serde(default)]
    pub linger: bool,
}

impl Config {
    /// Load configuration from file
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            anyhow::bail!(
                "Configuration file not found: {}\nRun with --init to create a new configuration",
                config_path.display()
            );
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read configuration file")?;

        let mut config: Config =
            serde_yaml::from_str(&contents).context("Failed to parse configuration file")?;
        config.config_file_path = config_path;

        config.validate()?;
        Ok(config)
    }

    /// Create and save a default configuration
    pub fn create_default(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_config_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Config {
            config_file_path: config_path.clone(),
            ..Config::default()
        };

        let yaml = serde_yaml::to_string(&config)?;
        fs::write(&config_path, yaml).context("Failed to write configuration file")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.controller.event_queue_capacity == 0 {
            anyhow::bail!("controller.event_queue_capacity must be greater than zero");
        }
        if let Some(aging) = &self.controller.mac_aging {
            if aging.interval_secs == 0 {
                anyhow::bail!("controller.mac_aging.interval_secs must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_file_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hopwired")
            .join("config.yaml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller: ControllerConfig {
                event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
                mac_aging: Some(MacAging::default()),
            },
            flow: FlowConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            scenario: ScenarioConfig::default(),
            config_file_path: Self::default_config_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let created = Config::create_default(Some(path.clone())).unwrap();
        assert!(path.exists());

        let loaded = Config::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.config_path(), path.as_path());
        assert_eq!(
            loaded.controller.event_queue_capacity,
            created.controller.event_queue_capacity
        );
        assert_eq!(loaded.flow.rule_defaults(), RuleDefaults::default());
        assert_eq!(loaded.logging.level, "info");
        assert_eq!(loaded.controller.mac_aging, Some(MacAging::default()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("--init"));
    }

    #[test]
    fn test_load_applies_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
controller: {}
flow:
  priority: 100
  idle_timeout_secs: 30
  hard_timeout_secs: 0
logging:
  level: debug
"#,
        )
        .unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(
            config.controller.event_queue_capacity,
            DEFAULT_EVENT_QUEUE_CAPACITY
        );
        assert!(config.flow.send_flow_removed);
        assert_eq!(config.flow.rule_defaults().idle_timeout, 30);
        assert!(config.scenario.path.is_none());
        assert!(!config.logging.json);
        assert!(config.controller.mac_aging.is_none());
    }

    #[test]
    fn test_load_mac_aging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
controller:
  mac_aging:
    interval_secs: 10
    max_age_secs: 120
flow:
  priority: 1
  idle_timeout_secs: 0
  hard_timeout_secs: 0
logging:
  level: info
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(
            config.controller.mac_aging,
            Some(MacAging {
                interval_secs: 10,
                max_age_secs: 120,
            })
        );

        fs::write(
            &path,
            "controller:\n  mac_aging: { interval_secs: 0, max_age_secs: 1 }\nflow: { priority: 1, idle_timeout_secs: 0, hard_timeout_secs: 0 }\nlogging: { level: info }\n",
        )
        .unwrap();
        assert!(Config::load(Some(path)).is_err());
    }

    #[test]
    fn test_zero_queue_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
controller:
  event_queue_capacity: 0
flow:
  priority: 1
  idle_timeout_secs: 0
  hard_timeout_secs: 0
logging:
  level: info
"#,
        )
        .unwrap();

        assert!(Config::load(Some(path)).is_err());
    }
}
