//! @ai:module:intent API key lookup and validation
//! @ai:module:layer infrastructure
//! @ai:module:stateless true

use std::path::Path;

const DOTENV_FILE: &str = ".env";

/// @ai:intent Find the API key in the environment, then in `<dir>/.env`
/// @ai:effects env, fs:read
pub fn resolve_api_key(var: &str, dir: &Path) -> Option<String> {
    if let Ok(value) = std::env::var(var) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            return Some(value);
        }
    }

    let content = std::fs::read_to_string(dir.join(DOTENV_FILE)).ok()?;
    read_dotenv_value(&content, var)
}

/// @ai:intent Extract `VAR=value` from dotenv content, stripping quotes
/// @ai:effects pure
fn read_dotenv_value(content: &str, var: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == var)
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|value| !value.is_empty())
}

/// @ai:intent Reject keys that cannot be Gemini API keys
/// @ai:effects pure
pub fn validate_api_key(key: &str) -> Result<(), &'static str> {
    let key = key.trim();
    if key.is_empty() {
        return Err("empty API key");
    }
    if !key.starts_with("AIza") {
        return Err("invalid key format (expected prefix 'AIza')");
    }
    if key.len() < 30 {
        return Err("key too short");
    }
    Ok(())
}
