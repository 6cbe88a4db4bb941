//! Configuration loading and persistence.

use super::Config;
use crate::env::{self, vars};
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "parley.json5";

impl Config {
    /// Resolve which config file to use.
    ///
    /// Order: the explicit path, then `PARLEY_CONFIG`, then `parley.json5`
    /// in the working directory if it exists.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = env::get_var(vars::PARLEY_CONFIG) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load the resolved config file, or defaults when there is none.
    ///
    /// A file that was asked for explicitly but is missing is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::resolve_path(explicit) {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment overrides (`PORT`).
    ///
    /// The API key is not copied here; it is resolved lazily through
    /// [`ProviderConfig::resolve_api_key`](super::ProviderConfig::resolve_api_key).
    pub fn apply_env(&mut self) {
        if let Some(port) = env::get_u16(vars::PORT) {
            self.gateway.port = port;
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // 1. Gateway
        if self.gateway.port == 0 {
            errors.push("Gateway port cannot be 0".to_string());
        }
        if self.gateway.host.trim().is_empty() {
            errors.push("Gateway host cannot be empty".to_string());
        }

        // 2. Provider
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            errors.push(format!(
                "Provider base_url '{}' must start with http:// or https://",
                self.provider.base_url
            ));
        }
        if self.provider.model.trim().is_empty() {
            errors.push("Provider model cannot be empty".to_string());
        }
        if self.provider.timeout_secs == 0 {
            errors.push("Provider timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            errors.push(format!(
                "Provider temperature must be 0.0-2.0, got {}",
                self.provider.temperature
            ));
        }
        if self.provider.max_tokens == 0 {
            errors.push("Provider max_tokens must be greater than 0".to_string());
        }

        // 3. Context budget
        if self.context.max_tokens == 0 {
            errors.push("Context max_tokens must be greater than 0".to_string());
        }
        if self.context.keep_recent == 0 {
            errors.push("Context keep_recent must be greater than 0".to_string());
        }
        if self.context.keep_recent > self.context.min_messages {
            errors.push(format!(
                "Context keep_recent ({}) exceeds min_messages ({})",
                self.context.keep_recent, self.context.min_messages
            ));
        }

        // 4. Summarizer must give up well before the completion call would
        if self.summarizer.timeout_secs == 0 {
            errors.push("Summarizer timeout_secs must be greater than 0".to_string());
        }
        if self.summarizer.timeout_secs >= self.provider.timeout_secs {
            errors.push(format!(
                "Summarizer timeout ({}s) must be shorter than the provider timeout ({}s)",
                self.summarizer.timeout_secs, self.provider.timeout_secs
            ));
        }
        if self.summarizer.max_chars == 0 {
            errors.push("Summarizer max_chars must be greater than 0".to_string());
        }

        // 5. Persona file must exist when configured
        if self.persona.system_prompt.is_none() {
            if let Some(path) = &self.persona.system_prompt_file {
                if !path.exists() {
                    errors.push(format!("Persona system_prompt_file {:?} does not exist", path));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// The persona system prompt, reading `system_prompt_file` if needed.
    pub fn persona_prompt(&self) -> Result<Option<String>, ConfigError> {
        if let Some(prompt) = &self.persona.system_prompt {
            return Ok(Some(prompt.clone()));
        }
        match &self.persona.system_prompt_file {
            Some(path) => {
                let prompt = fs::read_to_string(path)?;
                let prompt = prompt.trim();
                Ok((!prompt.is_empty()).then(|| prompt.to_string()))
            }
            None => Ok(None),
        }
    }
}
