use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "EPS Inaptitudes";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the extraction provider credential.
pub const API_KEY_ENV: &str = "EPS_SCAN_API_KEY";

/// Default log filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_CRATE_NAME"))
}

/// Get the application data directory
/// ~/EpsInaptitudes/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("EpsInaptitudes")
}

/// Path of the persisted exemption record collection.
pub fn records_path() -> PathBuf {
    app_data_dir().join("exemptions.json")
}

/// Read the extraction provider credential from the environment.
///
/// A set-but-blank variable is treated the same as an absent one: both must
/// surface as a credential problem before any network call is attempted.
pub fn extraction_api_key() -> Option<String> {
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => None,
    }
}
