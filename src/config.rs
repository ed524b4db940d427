use std::env;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "gpt-3.5-turbo"];

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Parley, a friendly and concise assistant. \
Answer in the language the user writes in and format with markdown when it helps.";

/// Which completion service the chat talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// HTTP chat-completions endpoint authenticated with the user's API key.
    Endpoint,
    /// AI SDK injected into the page as `window.puter`.
    Bridge,
}

impl Provider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "endpoint" | "http" | "openai" => Some(Self::Endpoint),
            "bridge" | "puter" => Some(Self::Bridge),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub default_model: String,
    pub models: Vec<String>,
    pub system_prompt: String,
    /// Credential used when nothing has been saved in storage yet.
    pub fallback_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Endpoint,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_api_key: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(raw) = var("PARLEY_PROVIDER") {
            match Provider::parse(&raw) {
                Some(provider) => config.provider = provider,
                None => tracing::warn!("unknown PARLEY_PROVIDER {raw:?}, using endpoint"),
            }
        }
        if let Some(endpoint) = var("PARLEY_ENDPOINT") {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(models) = var("PARLEY_MODELS") {
            let parsed = parse_model_list(&models);
            if !parsed.is_empty() {
                config.models = parsed;
            }
        }
        config.default_model = match var("PARLEY_MODEL") {
            Some(model) => model.trim().to_string(),
            None => config.models[0].clone(),
        };
        if !config.models.contains(&config.default_model) {
            config.models.insert(0, config.default_model.clone());
        }
        if let Some(prompt) = var("PARLEY_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        config.fallback_api_key = var("PARLEY_API_KEY").map(|key| key.trim().to_string());
        config
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for model in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if !models.iter().any(|existing| existing == model) {
            models.push(model.to_string());
        }
    }
    models
}

/// Apply `KEY=VALUE` lines to the environment without overriding what is already set.
pub fn apply_env_lines(contents: &str) {
    for (key, value) in parse_env_lines(contents) {
        if env::var(key).is_err() {
            // SAFETY: called at startup before any threads are spawned
            unsafe {
                env::set_var(key, value);
            }
        }
    }
}

fn parse_env_lines(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}
