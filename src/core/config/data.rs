use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::chat_stream::DEFAULT_BASE_URL;
use crate::core::persona::{ModelPolicy, Persona};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Persona for new sessions (e.g., "coder" or "Data Analyst")
    pub default_persona: Option<Persona>,
    /// Start with web search grounding enabled
    pub use_search: Option<bool>,
    /// Sampling temperature sent with every request
    pub temperature: Option<f32>,
    /// Model used when web search is off
    pub fast_model: Option<String>,
    /// Model used when web search is on
    pub pro_model: Option<String>,
    /// Override for the generation API base URL
    pub base_url: Option<String>,
}

/// Process-wide defaults applied to each generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    pub persona: Persona,
    pub use_search: bool,
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            use_search: false,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Config {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            persona: self.default_persona.unwrap_or_default(),
            use_search: self.use_search.unwrap_or(false),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }

    pub fn model_policy(&self) -> ModelPolicy {
        let defaults = ModelPolicy::default();
        ModelPolicy {
            fast_model: self.fast_model.clone().unwrap_or(defaults.fast_model),
            pro_model: self.pro_model.clone().unwrap_or(defaults.pro_model),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Remember the persona and search mode chosen in the UI.
    pub fn remember_agent(&mut self, agent: &AgentConfig) {
        self.default_persona = Some(agent.persona);
        self.use_search = Some(agent.use_search);
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/nexus/config.toml` → `~/.config/nexus/config.toml`
/// - Windows: `C:\\Users\\user\\AppData\\Roaming\\nexus\\config.toml` is shown unchanged
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
