//! Runtime configuration.
//!
//! Defaults suit a single front-desk workstation; a handful of values can
//! be overridden through `TRIAGEDESK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "triagedesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulated round-trip before a staff registration completes.
pub const DEFAULT_REGISTRATION_DELAY_MS: u64 = 800;

pub const ENV_REGISTRATION_DELAY_MS: &str = "TRIAGEDESK_REGISTRATION_DELAY_MS";
pub const ENV_EXPORT_DIR: &str = "TRIAGEDESK_EXPORT_DIR";
pub const ENV_ADMIN_PASSWORD: &str = "TRIAGEDESK_ADMIN_PASSWORD";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Identity of the one protected admin account seeded into the staff store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryAdmin {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
}

impl Default for PrimaryAdmin {
    fn default() -> Self {
        PrimaryAdmin {
            id: "STF003".to_string(),
            username: "admin".to_string(),
            password: "admin123".to_string(),
            name: "Primary Administrator".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub registration_delay: Duration,
    pub primary_admin: PrimaryAdmin,
    pub export_dir: PathBuf,
}

impl Default for DeskConfig {
    fn default() -> Self {
        DeskConfig {
            registration_delay: Duration::from_millis(DEFAULT_REGISTRATION_DELAY_MS),
            primary_admin: PrimaryAdmin::default(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl DeskConfig {
    /// Defaults overridden by whatever `TRIAGEDESK_*` variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DeskConfig::default();

        if let Some(raw) = lookup(ENV_REGISTRATION_DELAY_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.registration_delay = Duration::from_millis(ms),
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Ignoring {ENV_REGISTRATION_DELAY_MS}, using default"
                ),
            }
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR).filter(|d| !d.trim().is_empty()) {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD).filter(|p| !p.is_empty()) {
            config.primary_admin.password = password;
        }

        config
    }

    /// No simulated latency; used by tests and the demo.
    pub fn instant() -> Self {
        DeskConfig {
            registration_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}
