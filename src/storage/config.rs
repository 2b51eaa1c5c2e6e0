use super::Result;
use crate::error::{ConfigError, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_URL: &str = "http://localhost:8080/pnc-rest/v2";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    /// REST API base URL
    pub url: String,
    pub timeout_seconds: Option<u64>,
    /// Page size written when a list URL has none
    pub page_size: Option<u32>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_seconds: None,
            page_size: None,
        }
    }
}

impl Profile {
    pub const KEYS: [&'static str; 3] = ["url", "timeout_seconds", "page_size"];

    /// Set one field from its textual form.
    pub fn set_field(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "url" => {
                crate::utils::validation::validate_url(value).map_err(|e| invalid(e.as_str()))?;
                self.url = value.trim_end_matches('/').to_string();
            }
            "timeout_seconds" => {
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| invalid("expected a positive number of seconds"))?;
                self.timeout_seconds = Some(secs);
            }
            "page_size" => {
                let size = value
                    .parse::<u32>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| invalid("expected a positive integer"))?;
                self.page_size = Some(size);
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
            message: format!("{}: {}", config_path.display(), e),
        })
    }

    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigSaveFailed {
            message: e.to_string(),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(config_dir.join("pnc-console").join("config.toml"))
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Profile to use: the explicit one, else the default one, else `"default"`.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_profile, None);
        assert_eq!(config.profiles.len(), 0);
    }

    #[test]
    fn test_profile_management() {
        let mut config = Config::default();
        let profile = Profile {
            url: "http://pnc.example.test/pnc-rest/v2".to_string(),
            timeout_seconds: Some(30),
            page_size: Some(25),
        };
        config.set_profile("stage".to_string(), profile.clone());

        assert_eq!(config.get_profile("stage"), Some(&profile));
        assert!(config.get_profile("nonexistent").is_none());
    }

    #[test]
    fn test_profile_set_field() {
        let mut profile = Profile::default();
        profile
            .set_field("url", "https://pnc.example.test/pnc-rest/v2/")
            .expect("valid url");
        assert_eq!(profile.url, "https://pnc.example.test/pnc-rest/v2");

        profile.set_field("page_size", "50").expect("valid size");
        assert_eq!(profile.page_size, Some(50));

        assert!(matches!(
            profile.set_field("page_size", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            profile.set_field("url", "pnc.example.test"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            profile.set_field("colour", "red"),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_resolve_profile_name() {
        let mut config = Config::default();
        assert_eq!(config.resolve_profile_name(None), "default");

        config.default_profile = Some("stage".to_string());
        assert_eq!(config.resolve_profile_name(None), "stage");
        assert_eq!(config.resolve_profile_name(Some("prod")), "prod");
    }

    #[test]
    fn test_config_load_save() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.default_profile = Some("stage".to_string());
        config.set_profile(
            "stage".to_string(),
            Profile {
                url: "http://pnc.example.test".to_string(),
                timeout_seconds: Some(10),
                page_size: None,
            },
        );

        config
            .save(Some(config_path.clone()))
            .expect("Failed to save config");
        let loaded = Config::load(Some(config_path)).expect("Failed to load config");

        assert_eq!(loaded.default_profile, config.default_profile);
        assert_eq!(loaded.get_profile("stage"), config.get_profile("stage"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = Config::load(Some(temp_dir.path().join("missing.toml")))
            .expect("Failed to load default config");
        assert_eq!(config.default_profile, None);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "profiles = 3").expect("write config");

        assert!(matches!(
            Config::load(Some(config_path)),
            Err(StorageError::ConfigParseError { .. })
        ));
    }
}
