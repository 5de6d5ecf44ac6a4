use crate::analysis::DEFAULT_ENDPOINT;
use crate::popup::PopupSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    pub min_text_len: usize,
    pub preview_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let settings = PopupSettings::default();
        Self {
            min_text_len: settings.min_text_len,
            preview_chars: settings.preview_chars,
        }
    }
}

impl Config {
    /// `~/.config/phishscan/config.toml` on Linux, the platform equivalent elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("phishscan").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.endpoint_url()?;
        Ok(config)
    }

    /// Write the default config to `path`, creating parent directories.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.analysis.endpoint)
            .with_context(|| format!("Invalid analysis endpoint: {}", self.analysis.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "Analysis endpoint must be http or https, got: {}",
                self.analysis.endpoint
            );
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.analysis.timeout_secs.map(Duration::from_secs)
    }

    pub fn popup_settings(&self) -> PopupSettings {
        PopupSettings {
            min_text_len: self.extractor.min_text_len,
            preview_chars: self.extractor.preview_chars,
        }
    }
}
