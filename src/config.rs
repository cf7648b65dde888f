use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Oncolens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "oncolens=info,tower_http=info".to_string()
}

/// Get the application data directory
/// ~/Oncolens/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Oncolens")
}

/// Path of the flattened patient export loaded on startup.
/// Override with ONCOLENS_DATA; defaults to ~/Oncolens/patients.csv.
pub fn data_file() -> PathBuf {
    std::env::var("ONCOLENS_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_data_dir().join("patients.csv"))
}

/// Base URL of the local Ollama instance serving the insight model.
pub fn ollama_base_url() -> String {
    std::env::var("ONCOLENS_OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Insight model name. Any Ollama model that honours the JSON schema
/// instruction works; the default targets the bare MedGemma tag.
pub fn insight_model() -> String {
    std::env::var("ONCOLENS_MODEL").unwrap_or_else(|_| "medgemma".to_string())
}

/// Upper bound on one insight generation round-trip. Past this the
/// service cancels the call and serves the deterministic fallback.
pub fn insight_timeout() -> Duration {
    let secs = std::env::var("ONCOLENS_INSIGHT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120);
    Duration::from_secs(secs)
}

/// Bind address for the dashboard API.
pub fn bind_addr() -> String {
    std::env::var("ONCOLENS_BIND").unwrap_or_else(|_| "127.0.0.1:8787".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Oncolens"));
    }

    #[test]
    fn app_name_is_oncolens() {
        assert_eq!(APP_NAME, "Oncolens");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_scopes_to_crate() {
        assert!(default_log_filter().starts_with("oncolens="));
    }
}
