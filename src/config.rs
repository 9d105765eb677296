//! Configuration types for the voice conversation agent.
//!
//! All values here are read once at startup. The `llm` and `tts` sections
//! describe the externally-supplied collaborators (endpoint, credentials,
//! model identifiers); the crate itself never dials out to them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default system prompt seeding every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, friendly voice assistant.\n\
Keep your responses concise and conversational since they will be spoken aloud.\n\
Be natural and engaging. Limit responses to 2-3 sentences.";

/// Environment variable consulted for the generator API key when the config
/// file leaves it empty.
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

/// Top-level configuration for the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Transport audio settings.
    pub audio: AudioConfig,
    /// Voice activity segmentation settings.
    pub vad: VadConfig,
    /// Language model (generator) settings.
    pub llm: LlmConfig,
    /// Speech synthesis settings.
    pub tts: TtsConfig,
}

/// Transport audio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate of the media transport in Hz. Both incoming frames and
    /// published frames use this rate.
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
        }
    }
}

/// Voice activity segmentation configuration.
///
/// Durations are wall-clock milliseconds, converted to frame counts at the
/// fixed 10 ms transport frame duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// RMS amplitude threshold for speech detection, in i16 sample units.
    ///
    /// Frames with RMS strictly above this value are classified as speech.
    ///   - 50:  very sensitive (picks up quiet speech and some noise)
    ///   - 100: normal sensitivity (default)
    ///   - 300: reduced sensitivity (noisy rooms, distant microphones)
    pub energy_threshold: f32,
    /// Continued silence in ms required to close a speech segment.
    pub silence_hangover_ms: u32,
    /// Minimum segment length in ms; shorter segments are discarded.
    pub min_speech_ms: u32,
    /// Maximum segment length in ms before forced cutover. 0 disables the
    /// cap, letting an arbitrarily long utterance accumulate.
    pub max_speech_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 100.0,
            silence_hangover_ms: 1_000,
            min_speech_ms: 300,
            max_speech_ms: 0,
        }
    }
}

/// Language model (generator) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible generation endpoint.
    pub api_url: String,
    /// API key for the endpoint. Leave empty to read from `PARLEY_API_KEY`.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// System prompt seeding the conversation history.
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.studio.nebius.ai/v1".to_owned(),
            api_key: String::new(),
            model: "Qwen/Qwen3-235B-A22B".to_owned(),
            max_tokens: 200,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Path to the synthesizer's voice model.
    pub voice_model_path: PathBuf,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice_model_path: PathBuf::from("models/en_US-lessac-medium.onnx"),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AgentError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be
    /// serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AgentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/parley/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("parley").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("parley")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/parley-config/config.toml")
        }
    }

    /// Resolve the generator API key: the config value when set, otherwise
    /// the `PARLEY_API_KEY` environment variable, otherwise empty.
    pub fn resolve_api_key(&self) -> String {
        if !self.llm.api_key.is_empty() {
            return self.llm.api_key.clone();
        }
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }
}
