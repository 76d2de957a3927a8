use std::{env, fs, path::Path};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use thunklink::{PointerWidth, RegionError, SharedRegion};

/// Names a TOML file to read the host configuration from.
pub const CONFIG_ENV_VAR: &str = "WINTHUNK_CONFIG";

// === HostConfig === //

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub region: RegionConfig,
    pub diagnostics: DiagnosticsConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionConfig {
    pub base: u64,
    /// Defaults to everything the guest can address above `base`.
    pub size: Option<u64>,
    pub guest_pointer_width: PointerWidth,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Warn the first time each unverified call is forwarded.
    pub unverified_warnings: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            unverified_warnings: false,
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Handlers run inline on the calling thread.
    Direct,
    /// Handlers run on a dedicated host thread paired with each guest thread.
    #[default]
    Worker,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub max_callback_depth: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            max_callback_depth: 16,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed host configuration")]
    Parse(#[from] toml::de::Error),

    #[error("invalid shared region")]
    Region(#[from] RegionError),

    #[error("`transport.max_callback_depth` must be at least 1")]
    CallbackDepth,
}

impl HostConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read host configuration {}", path.display()))?;

        Self::from_toml(&text)
            .with_context(|| format!("failed to load host configuration {}", path.display()))
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or falls back to the defaults when it is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.max_callback_depth == 0 {
            return Err(ConfigError::CallbackDepth);
        }

        self.region()?;
        Ok(())
    }

    pub fn region(&self) -> Result<SharedRegion, ConfigError> {
        let RegionConfig {
            base,
            size,
            guest_pointer_width: width,
        } = self.region;

        let size = size.unwrap_or_else(|| width.space().min(u64::MAX - base));

        Ok(SharedRegion::new(base, size, width)?)
    }
}
