use crate::constants::*;
use crate::error::{Result, ScreenError};
use crate::types::{BrainTissue, PairBounds};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub downloads: DownloadConfig,
    pub braineac: BraineacConfig,
    pub ldlink: LdLinkConfig,
    pub gtex: GtexConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// What happens to a downloaded artifact after it has been read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetirePolicy {
    #[default]
    Rename,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub dir: PathBuf,
    pub poll_interval_ms: u64,
    pub wait_timeout_secs: u64,
    pub retire: RetirePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BraineacConfig {
    pub base_url: String,
    pub submit_path: String,
    pub artifact_name: String,
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LdLinkConfig {
    pub api_url: String,
    pub population: String,
    pub genome_build: String,
    pub token: Option<String>,
    pub r2_threshold: f64,
    pub startup_pause_ms: u64,
    pub wait_timeout_secs: u64,
    pub pair_bounds: PairBounds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GtexConfig {
    pub api_url: String,
    pub variant_url: String,
    pub gene_url: String,
    pub gencode_version: String,
    pub dataset_id: String,
    pub tissues: Vec<BrainTissue>,
    pub p_value_threshold: f64,
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            request_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            poll_interval_ms: DOWNLOAD_POLL_INTERVAL_MS,
            wait_timeout_secs: BRAINEAC_WAIT_SECS,
            retire: RetirePolicy::Rename,
        }
    }
}

impl Default for BraineacConfig {
    fn default() -> Self {
        Self {
            base_url: BRAINEAC_BASE_URL.to_string(),
            submit_path: BRAINEAC_SUBMIT_PATH.to_string(),
            artifact_name: BRAINEAC_ARTIFACT_NAME.to_string(),
            wait_timeout_secs: BRAINEAC_WAIT_SECS,
        }
    }
}

impl Default for LdLinkConfig {
    fn default() -> Self {
        Self {
            api_url: LDLINK_API_URL.to_string(),
            population: LDLINK_POPULATION.to_string(),
            genome_build: LDLINK_GENOME_BUILD.to_string(),
            token: None,
            r2_threshold: LD_R2_THRESHOLD,
            startup_pause_ms: LDLINK_STARTUP_PAUSE_MS,
            wait_timeout_secs: LDLINK_WAIT_SECS,
            pair_bounds: PairBounds::All,
        }
    }
}

impl Default for GtexConfig {
    fn default() -> Self {
        Self {
            api_url: GTEX_API_URL.to_string(),
            variant_url: GTEX_VARIANT_URL.to_string(),
            gene_url: GTEX_GENE_URL.to_string(),
            gencode_version: GTEX_GENCODE_VERSION.to_string(),
            dataset_id: GTEX_DATASET_ID.to_string(),
            tissues: BrainTissue::ALL.to_vec(),
            p_value_threshold: GTEX_P_VALUE_THRESHOLD,
            wait_timeout_secs: GTEX_WAIT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    /// The LDLink token is taken from the environment when the file has none.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScreenError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            let config: Config = toml::from_str(&content)?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        if config.ldlink.token.is_none() {
            config.ldlink.token = std::env::var(LDLINK_TOKEN_ENV).ok().filter(|t| !t.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Range checks for every numeric setting. Run again after anything,
    /// such as command-line flags, changes a loaded config.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ldlink.r2_threshold) {
            return Err(ScreenError::Config(format!(
                "ldlink.r2_threshold must be within [0, 1], got {}",
                self.ldlink.r2_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.gtex.p_value_threshold) {
            return Err(ScreenError::Config(format!(
                "gtex.p_value_threshold must be within [0, 1], got {}",
                self.gtex.p_value_threshold
            )));
        }
        if self.gtex.tissues.is_empty() {
            return Err(ScreenError::Config("gtex.tissues must name at least one tissue".into()));
        }
        if self.downloads.poll_interval_ms == 0 {
            return Err(ScreenError::Config("downloads.poll_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

impl DownloadConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}
