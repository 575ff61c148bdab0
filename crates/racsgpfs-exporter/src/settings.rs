//! Process settings, read once at startup.
//!
//! Environment variables provide the defaults; command-line flags win.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use racsgpfs_quota::QuotaConfig;

/// Presence (any value) turns on debug logging.
pub const DEBUG_ENV: &str = "RACSGPFS_EXPORTER_DEBUG";
pub const LISTEN_ADDRESS_ENV: &str = "RACSGPFS_EXPORTER_LISTEN_ADDRESS";
pub const CONFIG_ENV: &str = "RACSGPFS_EXPORTER_CONFIG";

pub const DEFAULT_LISTEN_ADDRESS: &str = ":8030";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub debug: bool,
    /// Bindable `host:port`.
    pub listen_address: String,
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let listen = lookup(LISTEN_ADDRESS_ENV)
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());

        Self {
            debug: lookup(DEBUG_ENV).is_some(),
            listen_address: normalize_listen_address(&listen),
            config_path: lookup(CONFIG_ENV).map(PathBuf::from),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        listen_address: Option<&str>,
        config: Option<&Path>,
        debug: bool,
    ) -> Self {
        if let Some(addr) = listen_address {
            self.listen_address = normalize_listen_address(addr);
        }
        if let Some(path) = config {
            self.config_path = Some(path.to_path_buf());
        }
        self.debug |= debug;
        self
    }

    /// The configured source file, or the built-in single-report default.
    pub fn load_quota_config(&self) -> anyhow::Result<QuotaConfig> {
        match &self.config_path {
            Some(path) => QuotaConfig::from_file(path)
                .with_context(|| format!("loading quota config {}", path.display())),
            None => Ok(QuotaConfig::default()),
        }
    }
}

/// `:8030` listens on every interface, as the address is written for
/// other exporters.
pub fn normalize_listen_address(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}
