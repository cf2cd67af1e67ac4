use anyhow::{Context, Result};
use fieldkit_core::SamplingPlan;
use fieldkit_session::SyncConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "fieldkit.toml";
const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";
const PLACEHOLDER_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Files,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: Backend,
    /// Directory for `files`, database file for `sqlite`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSection {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldkitConfig {
    pub storage: StorageSection,
    pub sync: SyncSection,
    pub plan: PlanSection,
    pub export: ExportSection,
}

impl FieldkitConfig {
    /// Reads the config file (explicit path, `FIELDKIT_CONFIG`, then
    /// `./fieldkit.toml`) and applies environment overrides. A missing file
    /// means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);
        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Self::parse(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(dir) = value("FIELDKIT_DATA_DIR") {
            self.storage.path = Some(PathBuf::from(dir));
        }
        if let Some(url) = value("FIELDKIT_SYNC_URL") {
            self.sync.url = Some(url);
        }
        if let Some(key) = value("FIELDKIT_SYNC_KEY") {
            self.sync.api_key = Some(key);
        }
    }

    /// Storage location for the configured backend.
    pub fn storage_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        let base = dirs::data_local_dir()
            .map(|dir| dir.join("fieldkit"))
            .unwrap_or_else(|| PathBuf::from(".fieldkit/data"));
        match self.storage.backend {
            Backend::Sqlite => base.join("fieldkit.db"),
            Backend::Files | Backend::Memory => base,
        }
    }

    /// Sync is enabled only when both URL and key are set to real values.
    pub fn sync_config(&self) -> Option<SyncConfig> {
        let url = self
            .sync
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_URL)?;
        let key = self
            .sync
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)?;

        let mut config = SyncConfig::new(url, key);
        if let Some(table) = self.sync.table.as_deref().filter(|t| !t.trim().is_empty()) {
            config.table = table.trim().to_string();
        }
        if let Some(secs) = self.sync.timeout_secs {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        Some(config)
    }

    pub fn load_plan(&self) -> Result<SamplingPlan> {
        let Some(path) = &self.plan.file else {
            return Ok(SamplingPlan::builtin());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sampling plan {}", path.display()))?;
        let plan: SamplingPlan = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse sampling plan {}", path.display()))?;
        plan.validate()
            .with_context(|| format!("Invalid sampling plan {}", path.display()))?;
        Ok(plan)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("FIELDKIT_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn full_file_parses() {
        let config = FieldkitConfig::parse(
            r#"
            [storage]
            backend = "sqlite"
            path = "/var/lib/fieldkit/field.db"

            [sync]
            url = "https://example.supabase.co"
            api_key = "anon"
            table = "samples_2026"
            timeout_secs = 3

            [plan]
            file = "plan.toml"

            [export]
            dir = "exports"
            "#,
        )
        .expect("parse");

        assert_eq!(config.storage.backend, Backend::Sqlite);
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/var/lib/fieldkit/field.db")
        );
        let sync = config.sync_config().expect("sync enabled");
        assert_eq!(
            sync.endpoint(),
            "https://example.supabase.co/rest/v1/samples_2026"
        );
        assert_eq!(sync.timeout, Duration::from_secs(3));
        assert_eq!(config.export_dir(), PathBuf::from("exports"));
    }

    #[test]
    fn empty_file_means_defaults() {
        let config = FieldkitConfig::parse("").expect("parse");
        assert_eq!(config, FieldkitConfig::default());
        assert_eq!(config.storage.backend, Backend::Files);
        assert!(config.sync_config().is_none());
    }

    #[test]
    fn placeholders_and_partial_sync_settings_disable_sync() {
        let mut config = FieldkitConfig::default();
        config.sync.url = Some(PLACEHOLDER_URL.to_string());
        config.sync.api_key = Some("anon".to_string());
        assert!(config.sync_config().is_none());

        config.sync.url = Some("https://example.supabase.co".to_string());
        config.sync.api_key = None;
        assert!(config.sync_config().is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = FieldkitConfig::default();
        config.sync.url = Some("https://file.example".to_string());
        let env: HashMap<&str, &str> = HashMap::from([
            ("FIELDKIT_DATA_DIR", "/tmp/fk"),
            ("FIELDKIT_SYNC_URL", "https://env.example"),
            ("FIELDKIT_SYNC_KEY", "env-key"),
        ]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage_path(), PathBuf::from("/tmp/fk"));
        let sync = config.sync_config().expect("sync");
        assert_eq!(sync.url, "https://env.example");
        assert_eq!(sync.api_key, "env-key");
    }

    #[test]
    fn plan_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plan.toml");
        fs::write(
            &path,
            r#"
            name = "Test strip"

            [[points]]
            number = 1
            grid = "A1"
            lat = 28.1
            lon = 77.78
            elevation = "low"

            [[points]]
            number = 2
            grid = "A2"
            lat = 28.1002
            lon = 77.7801
            elevation = "high"
            "#,
        )
        .expect("write plan");

        let mut config = FieldkitConfig::default();
        config.plan.file = Some(path.clone());
        let plan = config.load_plan().expect("load plan");
        assert_eq!(plan.name, "Test strip");
        assert_eq!(plan.len(), 2);
        assert!(plan.boundary.is_empty());

        fs::write(
            &path,
            r#"
            name = "Broken"
            [[points]]
            number = 0
            grid = "A1"
            lat = 28.1
            lon = 77.78
            elevation = "low"
            "#,
        )
        .expect("rewrite plan");
        assert!(config.load_plan().is_err());
    }
}
