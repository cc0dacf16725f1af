use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use parley_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_key) in effective_values(&config) {
        let source = field_source(
            key_path,
            env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, Option<&'static str>)> {
    let optional = |value: Option<&str>| value.unwrap_or("<unset>").to_string();
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        ("database.url", config.database.url.clone(), Some("PARLEY_DATABASE_URL")),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            Some("PARLEY_DATABASE_MAX_CONNECTIONS"),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            Some("PARLEY_DATABASE_TIMEOUT_SECS"),
        ),
        ("llm.provider", config.llm.provider.as_str().to_string(), Some("PARLEY_LLM_PROVIDER")),
        ("llm.api_key", api_key, Some("PARLEY_LLM_API_KEY")),
        ("llm.base_url", config.llm.endpoint_base().to_string(), Some("PARLEY_LLM_BASE_URL")),
        (
            "llm.negotiation_model",
            optional(config.llm.negotiation_model.as_deref()),
            Some("PARLEY_LLM_NEGOTIATION_MODEL"),
        ),
        (
            "llm.drafting_model",
            optional(config.llm.drafting_model.as_deref()),
            Some("PARLEY_LLM_DRAFTING_MODEL"),
        ),
        (
            "llm.analysis_model",
            optional(config.llm.analysis_model.as_deref()),
            Some("PARLEY_LLM_ANALYSIS_MODEL"),
        ),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), Some("PARLEY_LLM_TIMEOUT_SECS")),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            Some("PARLEY_SERVER_BIND_ADDRESS"),
        ),
        ("server.port", config.server.port.to_string(), Some("PARLEY_SERVER_PORT")),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            Some("PARLEY_SERVER_GRACEFUL_SHUTDOWN_SECS"),
        ),
        ("logging.level", config.logging.level.clone(), Some("PARLEY_LOGGING_LEVEL")),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            Some("PARLEY_LOGGING_FORMAT"),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("parley.toml"), PathBuf::from("config/parley.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the vendor prefix of keys such as `sk-...` so operators can tell them apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
