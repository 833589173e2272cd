use crate::error::Result;
use crate::event::EventType;
use crate::fetch::{ALLORIGINS_RELAY, CORSPROXY_RELAY, FetchStrategy};
use crate::filter::{BannedPattern, FilterSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User settings, stored as camelCase JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ics_url: String,
    pub secondary_ics_url: Option<String>,
    pub group_number: Option<u32>,
    pub banned_patterns: Vec<BannedPattern>,
    pub hidden_subjects: Vec<String>,
    pub hidden_types: Vec<EventType>,
    /// Relay prefixes tried in order after the direct request
    pub relays: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ics_url: String::new(),
            secondary_ics_url: None,
            group_number: None,
            banned_patterns: Vec::new(),
            hidden_subjects: Vec::new(),
            hidden_types: Vec::new(),
            relays: default_relays(),
        }
    }
}

fn default_relays() -> Vec<String> {
    vec![ALLORIGINS_RELAY.to_string(), CORSPROXY_RELAY.to_string()]
}

impl Settings {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campuscal")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Stored settings, or defaults when nothing has been saved yet
    pub fn load() -> Result<Settings> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Secondary URL, if one is set and not blank
    pub fn secondary_url(&self) -> Option<&str> {
        self.secondary_ics_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn strategies(&self) -> Vec<FetchStrategy> {
        FetchStrategy::chain(&self.relays)
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            banned_patterns: self.banned_patterns.clone(),
            hidden_subjects: self.hidden_subjects.clone(),
            hidden_types: self.hidden_types.clone(),
            group_number: self.group_number,
        }
    }
}
