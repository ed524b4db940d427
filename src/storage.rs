//! Persistent key/value storage for the chat client
//!
//! The only value kept across sessions is the user's API credential:
//! - `window.localStorage` on the web
//! - one file per key under the platform data directory elsewhere

use anyhow::Result;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context;
#[cfg(not(target_arch = "wasm32"))]
use std::{fs, path::PathBuf};

/// Fixed key the credential lives under.
pub const CREDENTIAL_KEY: &str = "parley_api_key";

/// Sanitize storage key for filesystem use
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

// ============================================
// Storage Backend (for native platforms)
// ============================================

/// `PARLEY_STORAGE_DIR` when set, else `<data dir>/parley/storage`.
#[cfg(not(target_arch = "wasm32"))]
fn storage_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_STORAGE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("parley").join("storage");
    }
    PathBuf::from("cache").join("storage")
}

#[cfg(not(target_arch = "wasm32"))]
fn key_path(key: &str) -> PathBuf {
    storage_dir().join(format!("{}.json", sanitize_key(key)))
}

/// Get a value from storage
#[cfg(not(target_arch = "wasm32"))]
pub fn storage_get(key: &str) -> Option<String> {
    fs::read_to_string(key_path(key)).ok()
}

/// Set a value in storage
#[cfg(not(target_arch = "wasm32"))]
pub fn storage_set(key: &str, value: &str) -> Result<()> {
    let dir = storage_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create storage directory {}", dir.display()))?;
    let path = key_path(key);
    fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
}

/// Delete a value from storage
#[cfg(not(target_arch = "wasm32"))]
pub fn storage_delete(key: &str) -> Result<()> {
    let path = key_path(key);
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
    }
    Ok(())
}

// ============================================
// Storage Backend (browser)
// ============================================

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage> {
    web_sys::window()
        .ok_or_else(|| anyhow::anyhow!("no window available"))?
        .local_storage()
        .map_err(|_| anyhow::anyhow!("localStorage is not accessible"))?
        .ok_or_else(|| anyhow::anyhow!("localStorage is disabled"))
}

#[cfg(target_arch = "wasm32")]
pub fn storage_get(key: &str) -> Option<String> {
    local_storage()
        .ok()?
        .get_item(&sanitize_key(key))
        .ok()
        .flatten()
}

#[cfg(target_arch = "wasm32")]
pub fn storage_set(key: &str, value: &str) -> Result<()> {
    local_storage()?
        .set_item(&sanitize_key(key), value)
        .map_err(|_| anyhow::anyhow!("failed to write {key} to localStorage"))
}

#[cfg(target_arch = "wasm32")]
pub fn storage_delete(key: &str) -> Result<()> {
    local_storage()?
        .remove_item(&sanitize_key(key))
        .map_err(|_| anyhow::anyhow!("failed to remove {key} from localStorage"))
}

// ============================================
// Credential
// ============================================

/// Read the saved API credential, ignoring blank values.
pub fn load_credential() -> Option<String> {
    storage_get(CREDENTIAL_KEY)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Save the API credential; a blank value removes it.
pub fn save_credential(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::info!("clearing saved credential");
        return storage_delete(CREDENTIAL_KEY);
    }
    tracing::info!("saving credential");
    storage_set(CREDENTIAL_KEY, trimmed)
}

/// Mask a credential for display, keeping only its last four characters.
pub fn mask_credential(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "•".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "•".repeat(8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("parley_api_key"), "parley_api_key");
        assert_eq!(sanitize_key("user:preferences"), "user_preferences");
        assert_eq!(sanitize_key(&"k".repeat(100)).len(), 64);
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential("sk-abcdef1234"), "••••••••1234");
        assert_eq!(mask_credential("abc"), "•••");
        assert_eq!(mask_credential(""), "");
    }
}
