use crate::ai_provider::AiProvider;
use crate::error::{AdvisorError, Result};
use crate::request::RequestDefaults;
use repair_advisor_common::{DEFAULT_BUDGET, DEFAULT_LOCATION, DEFAULT_SKILL_LEVEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-wide settings, loaded once at start and read-only afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ai_provider: AiProvider,
    pub api_key: Option<String>,
    /// None: provider default
    pub analysis_model: Option<String>,
    /// None: provider default
    pub narrative_model: Option<String>,
    /// None: provider default endpoint
    pub api_base_url: Option<String>,
    pub timeout_seconds: u64,
    pub default_skill_level: String,
    pub default_budget: String,
    pub default_location: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::default(),
            api_key: None,
            analysis_model: None,
            narrative_model: None,
            api_base_url: None,
            timeout_seconds: 120,
            default_skill_level: DEFAULT_SKILL_LEVEL.into(),
            default_budget: DEFAULT_BUDGET.into(),
            default_location: DEFAULT_LOCATION.into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AdvisorError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("repair-advisor").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // environment wins over the stored key
        let env_var = self.ai_provider.api_key_env();
        if let Ok(key) = std::env::var(env_var) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdvisorError::MissingApiKey(env_var))
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn analysis_model(&self) -> &str {
        self.analysis_model
            .as_deref()
            .unwrap_or_else(|| self.ai_provider.default_analysis_model())
    }

    pub fn narrative_model(&self) -> &str {
        self.narrative_model
            .as_deref()
            .unwrap_or_else(|| self.ai_provider.default_narrative_model())
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.ai_provider.default_base_url())
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            skill_level: self.default_skill_level.clone(),
            budget: self.default_budget.clone(),
            location: self.default_location.clone(),
        }
    }
}
