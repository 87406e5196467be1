//! Configuration handling for form building

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_token_field() -> String {
    "_token".to_string()
}

fn default_method_field() -> String {
    "_method".to_string()
}

fn default_honeypot_field() -> String {
    "my_name".to_string()
}

fn default_honeytime_field() -> String {
    "my_time".to_string()
}

fn default_native_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string()]
}

/// Names and switches for the system fields every root form carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormletsConfig {
    /// Hidden field holding the session's anti-forgery token
    pub token_field: String,
    /// Hidden field carrying the spoofed verb
    pub method_field: String,
    /// Spam trap text field that must stay empty
    pub honeypot_field: String,
    /// Spam trap timestamp field
    pub honeytime_field: String,
    /// Verbs a browser form can send without spoofing
    pub native_methods: Vec<String>,
    /// Add the spam trap fields to every root form
    pub spam_trap: bool,
}

impl Default for FormletsConfig {
    fn default() -> Self {
        Self {
            token_field: default_token_field(),
            method_field: default_method_field(),
            honeypot_field: default_honeypot_field(),
            honeytime_field: default_honeytime_field(),
            native_methods: default_native_methods(),
            spam_trap: false,
        }
    }
}

impl FormletsConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formlets", "formlets")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the user's config dir, or defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: FormletsConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the user's config dir
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Whether `method` has to be spoofed through the method field
    pub fn needs_spoofing(&self, method: &str) -> bool {
        !self
            .native_methods
            .iter()
            .any(|native| native.eq_ignore_ascii_case(method))
    }
}
