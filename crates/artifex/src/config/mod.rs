use serde::Deserialize;

use crate::relay::Provider;

/// Main configuration structure for Artifex
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Default generation parameters
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Overall upstream request timeout in seconds. LLM generations can
    /// legitimately run for minutes, so this bounds the whole streamed
    /// response, not individual chunks.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Per-provider configuration for all supported upstream providers
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default: Provider,
    /// Groq configuration
    #[serde(default = "ProviderEntry::groq")]
    pub groq: ProviderEntry,
    /// OpenAI configuration
    #[serde(default = "ProviderEntry::openai")]
    pub openai: ProviderEntry,
    /// OpenRouter configuration
    #[serde(default = "ProviderEntry::openrouter")]
    pub openrouter: ProviderEntry,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            groq: ProviderEntry::groq(),
            openai: ProviderEntry::openai(),
            openrouter: ProviderEntry::openrouter(),
        }
    }
}

impl ProvidersConfig {
    /// Look up the entry for a provider
    pub fn entry(&self, provider: Provider) -> &ProviderEntry {
        match provider {
            Provider::Groq => &self.groq,
            Provider::OpenAi => &self.openai,
            Provider::OpenRouter => &self.openrouter,
        }
    }
}

fn default_provider() -> Provider {
    Provider::Groq
}

/// Configuration for a single upstream provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Override for the provider's base URL (testing, self-hosted gateways)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderEntry {
    fn groq() -> Self {
        Self {
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: None,
        }
    }

    fn openai() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
        }
    }

    fn openrouter() -> Self {
        Self {
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            base_url: None,
        }
    }
}

/// Default generation parameters applied when a request omits them
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    8000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8787");
        assert_eq!(config.server.timeout_secs, 300);
        assert_eq!(config.providers.default, Provider::Groq);
        assert_eq!(config.providers.groq.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(
            config.providers.openrouter.api_key_env,
            "OPENROUTER_API_KEY"
        );
        assert!(config.providers.groq.base_url.is_none());
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 8000);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:9090"
timeout_secs = 120

[providers]
default = "openrouter"

[providers.groq]
api_key_env = "MY_GROQ_KEY"
base_url = "http://localhost:9999/v1"

[generation]
temperature = 0.2
max_tokens = 4096
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.timeout_secs, 120);
        assert_eq!(config.providers.default, Provider::OpenRouter);
        assert_eq!(config.providers.groq.api_key_env, "MY_GROQ_KEY");
        assert_eq!(
            config.providers.groq.base_url.as_deref(),
            Some("http://localhost:9999/v1")
        );
        // Unspecified providers keep their defaults
        assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 4096);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "127.0.0.1:3000"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.server.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.server.timeout_secs, 300);
        assert_eq!(config.providers.default, Provider::Groq);
        assert_eq!(config.generation.max_tokens, 8000);
    }

    #[test]
    fn test_provider_case_insensitive_in_toml() {
        let config: Config =
            toml::from_str("[providers]\ndefault = \"OpenAI\"\n").expect("Failed to parse TOML");
        assert_eq!(config.providers.default, Provider::OpenAi);
    }

    #[test]
    fn test_provider_entry_lookup() {
        let config = Config::default();
        assert_eq!(
            config.providers.entry(Provider::Groq).api_key_env,
            "GROQ_API_KEY"
        );
        assert_eq!(
            config.providers.entry(Provider::OpenAi).api_key_env,
            "OPENAI_API_KEY"
        );
        assert_eq!(
            config.providers.entry(Provider::OpenRouter).api_key_env,
            "OPENROUTER_API_KEY"
        );
    }
}
