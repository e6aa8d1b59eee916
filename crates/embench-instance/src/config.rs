use anyhow::{Context, Result};
use embench_app_api::{AppSettings, AuthRealm};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Controller configuration, loadable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Fixed scratch location; omitted means a fresh temp dir per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_path: Option<PathBuf>,

    /// Keep the scratch directory after the run for inspection.
    #[serde(default)]
    pub retain_scratch: bool,

    /// Treat a failed scratch reclamation as an error instead of a warning.
    #[serde(default)]
    pub require_clean_reclamation: bool,

    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    /// Fixed listen port; omitted means an ephemeral port per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bound on the wait for the application's readiness signal.
    #[serde(default = "default_init_timeout", with = "duration_serde")]
    pub init_timeout: Duration,

    /// Directories scanned for packaged extension artifacts, in order.
    #[serde(default)]
    pub extension_search_path: Vec<PathBuf>,

    /// Extensions that must be materialized for startup to proceed.
    #[serde(default)]
    pub required_extensions: Vec<String>,

    /// Namespace patterns resolved locally by the masked harness domain.
    #[serde(default = "default_allow_list")]
    pub allow_list: Vec<String>,

    #[serde(default)]
    pub settings: AppSettings,

    #[serde(default)]
    pub realm: AuthRealm,
}

fn default_listen_host() -> String {
    "127.0.0.1".to_string()
}

fn default_init_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_allow_list() -> Vec<String> {
    embench_domain::DEFAULT_ALLOW_LIST
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            scratch_path: None,
            retain_scratch: false,
            require_clean_reclamation: false,
            listen_host: default_listen_host(),
            port: None,
            init_timeout: default_init_timeout(),
            extension_search_path: Vec::new(),
            required_extensions: Vec::new(),
            allow_list: default_allow_list(),
            settings: AppSettings::hermetic(),
            realm: AuthRealm::well_known(),
        }
    }
}

impl InstanceConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: InstanceConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.listen_host.is_empty() {
            anyhow::bail!("listen_host must not be empty");
        }
        if self.port == Some(0) {
            anyhow::bail!("port 0 is not a valid fixed port; omit it for an ephemeral port");
        }
        if self.init_timeout.is_zero() {
            anyhow::bail!("init_timeout must be positive");
        }
        if self.allow_list.is_empty() {
            anyhow::bail!("allow_list must name at least one namespace pattern");
        }
        Ok(())
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let secs = duration.as_secs();
        serializer.serialize_str(&format!("{}s", secs))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        // Check for "ms" BEFORE "s" since "ms" ends with 's'
        if s.ends_with("ms") {
            let num_str = &s[..s.len() - 2];
            let millis: u64 = num_str
                .parse()
                .map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if s.ends_with('s') {
            let num_str = &s[..s.len() - 1];
            let secs: u64 = num_str
                .parse()
                .map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if s.ends_with('m') {
            let num_str = &s[..s.len() - 1];
            let mins: u64 = num_str
                .parse()
                .map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(mins * 60))
        } else {
            // Bare number means seconds
            let secs: u64 = s.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        }
    }
}
