use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub dirs: DirsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub persist: PersistConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.fetch.base_url)
            .with_context(|| format!("fetch.base_url is not a valid url: {}", self.fetch.base_url))?;
        if let Some(index_url) = &self.fetch.index_url {
            Url::parse(index_url)
                .with_context(|| format!("fetch.index_url is not a valid url: {index_url}"))?;
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be positive");
        }
        if self.sources.gdp_file.trim().is_empty() {
            bail!("sources.gdp_file must not be empty");
        }
        if self.sources.population_file.trim().is_empty() {
            bail!("sources.population_file must not be empty");
        }
        Ok(())
    }

    pub fn gdp_path(&self) -> PathBuf {
        self.dirs.data_dir.join(&self.sources.gdp_file)
    }

    pub fn population_path(&self) -> PathBuf {
        self.dirs.data_dir.join(&self.sources.population_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub index_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl FetchConfig {
    pub fn index_url(&self) -> String {
        self.index_url
            .clone()
            .unwrap_or_else(|| format!("{}/demographics/", self.base_url.trim_end_matches('/')))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_url: None,
            timeout_secs: default_timeout_secs(),
            delay_ms: 0,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_gdp_file")]
    pub gdp_file: String,
    #[serde(default = "default_population_file")]
    pub population_file: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            gdp_file: default_gdp_file(),
            population_file: default_population_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistConfig {
    #[serde(default = "default_true")]
    pub snapshots: bool,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self { snapshots: true }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse toml in {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_base_url() -> String {
    "https://www.worldometers.info".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_gdp_file() -> String {
    "gdp_per_capita_2021.csv".to_string()
}

fn default_population_file() -> String {
    "population_2021.csv".to_string()
}

fn default_true() -> bool {
    true
}
