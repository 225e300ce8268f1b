use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PORTAL_DIR: &str = ".medportal";
pub const SESSION_DIR: &str = ".medportal/session";
pub const CONFIG_FILE: &str = ".medportal/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn session_dir(root: &Path) -> PathBuf {
    root.join(SESSION_DIR)
}

/// Session keys become file names; anything outside `[A-Za-z0-9_-]` is
/// replaced so a key can never escape the session directory.
pub fn session_key_file(root: &Path, key: &str) -> PathBuf {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    session_dir(root).join(safe)
}
