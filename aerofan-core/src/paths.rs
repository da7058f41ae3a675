//! Default path resolution for the settings document
//!
//! Uses XDG Base Directory specification when available, with sensible fallbacks.

use std::path::PathBuf;

/// Returns the default path for the settings document.
///
/// Uses XDG config directory if available:
/// - Linux/macOS: `~/.config/aerofan/settings.json`
/// - Fallback: `/etc/aerofan/settings.json`
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("aerofan")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_path_is_json() {
        let path = default_settings_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(path.ends_with("aerofan/settings.json"));
    }
}
