use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;

/// Top-level application settings, loaded from `calypso.toml` with
/// serde defaults for everything so the server runs out of the box.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub amadeus: AmadeusSettings,
    #[serde(default)]
    pub places: PlacesSettings,
    #[serde(default)]
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// LLM provider configuration. The API key is read from the named
/// environment variable, never stored in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_llm_key_env(),
            base_url: None,
            temperature: Some(0.7),
            max_output_tokens: None,
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AmadeusSettings {
    #[serde(default = "default_amadeus_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_amadeus_secret_env")]
    pub api_secret_env: String,
    #[serde(default = "default_amadeus_url")]
    pub base_url: String,
}

impl Default for AmadeusSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_amadeus_key_env(),
            api_secret_env: default_amadeus_secret_env(),
            base_url: default_amadeus_url(),
        }
    }
}

fn default_amadeus_key_env() -> String {
    "AMADEUS_API_KEY".to_string()
}

fn default_amadeus_secret_env() -> String {
    "AMADEUS_API_SECRET".to_string()
}

fn default_amadeus_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacesSettings {
    #[serde(default = "default_places_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_places_url")]
    pub base_url: String,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_places_key_env(),
            base_url: default_places_url(),
        }
    }
}

fn default_places_key_env() -> String {
    "GOOGLE_PLACES_API_KEY".to_string()
}

fn default_places_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

/// Turn and refinement budgets for the agent loops.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitSettings {
    /// Maximum model turns inside one specialist agent invocation
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Maximum refinement rounds per human-in-the-loop cycle,
    /// counted separately from model turns
    #[serde(default = "default_max_refinements")]
    pub max_refinements: u32,
    /// Result count requested from Phase 2 searches (restaurants,
    /// attractions) to give the itinerary generator variety
    #[serde(default = "default_phase2_results")]
    pub phase2_results: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_refinements: default_max_refinements(),
            phase2_results: default_phase2_results(),
        }
    }
}

fn default_max_turns() -> u32 {
    5
}

fn default_max_refinements() -> u32 {
    2
}

fn default_phase2_results() -> usize {
    15
}

impl Settings {
    /// Load settings from the default `calypso.toml` location.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_file(Path::new("calypso.toml"))
    }

    /// Load settings from an explicit config file path. A missing file
    /// is not an error; defaults apply.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Apply CLI overrides on top of file-loaded settings.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.llm.model, "gemini-2.5-flash");
        assert_eq!(settings.limits.max_turns, 5);
        assert_eq!(settings.limits.max_refinements, 2);
    }
}
