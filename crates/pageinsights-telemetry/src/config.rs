//! Telemetry configuration resolution and layered loading

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Instrumentation key shipped with the extension
pub const DEFAULT_INSTRUMENTATION_KEY: &str = "1a3f9226-224a-4802-9793-ba64f10437ec";

/// Cloud role stamped on items when the operator sets none
pub const DEFAULT_CLOUD_ROLE: &str = "sharepoint-page";

/// Office and Bing endpoints the page talks to on every load
pub const DEFAULT_EXCLUDED_DEPENDENCY_TARGETS: &str = "browser.pipe.aria.microsoft.com\n\
business.bing.com\n\
measure.office.com\n\
officeapps.live.com\n\
outlook.office365.com\n\
outlook.office.com";

/// Errors raised while loading configuration sources
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse telemetry properties: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// Fully resolved telemetry configuration for one page session
///
/// Produced once by [`resolve`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub enabled: bool,
    pub instrumentation_key: String,
    pub track_user_id: bool,
    pub track_exceptions: bool,
    pub cloud_role: String,
    pub cloud_role_instance: String,
    /// Raw, newline-delimited host list
    pub excluded_dependency_targets: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            instrumentation_key: DEFAULT_INSTRUMENTATION_KEY.to_string(),
            track_user_id: true,
            track_exceptions: true,
            cloud_role: DEFAULT_CLOUD_ROLE.to_string(),
            cloud_role_instance: String::new(),
            excluded_dependency_targets: DEFAULT_EXCLUDED_DEPENDENCY_TARGETS.to_string(),
        }
    }
}

/// Operator-supplied settings; any subset of fields may be present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub enabled: Option<bool>,
    pub instrumentation_key: Option<String>,
    pub track_user_id: Option<bool>,
    pub track_exceptions: Option<bool>,
    pub cloud_role: Option<String>,
    pub cloud_role_instance: Option<String>,
    pub excluded_dependency_targets: Option<String>,
}

impl ConfigOverrides {
    /// Parse host component properties (a JSON object)
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read host component properties from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Read the `[telemetry]` section of a TOML config file
    ///
    /// A file without the section yields empty overrides.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        #[derive(Deserialize)]
        struct FullConfig {
            #[serde(default)]
            telemetry: Option<ConfigOverrides>,
        }

        let full_config: FullConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(full_config.telemetry.unwrap_or_default())
    }

    /// Layer `later` on top of `self`; fields present in `later` win
    pub fn merge(&mut self, later: ConfigOverrides) {
        self.enabled = later.enabled.or(self.enabled);
        self.instrumentation_key = later.instrumentation_key.or(self.instrumentation_key.take());
        self.track_user_id = later.track_user_id.or(self.track_user_id);
        self.track_exceptions = later.track_exceptions.or(self.track_exceptions);
        self.cloud_role = later.cloud_role.or(self.cloud_role.take());
        self.cloud_role_instance = later.cloud_role_instance.or(self.cloud_role_instance.take());
        self.excluded_dependency_targets = later
            .excluded_dependency_targets
            .or(self.excluded_dependency_targets.take());
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Merge overrides over defaults, field by field
///
/// No value validation happens here; a malformed instrumentation key is
/// passed through and left for the SDK to reject.
pub fn resolve(defaults: &EffectiveConfig, overrides: &ConfigOverrides) -> EffectiveConfig {
    EffectiveConfig {
        enabled: overrides.enabled.unwrap_or(defaults.enabled),
        instrumentation_key: overrides
            .instrumentation_key
            .clone()
            .unwrap_or_else(|| defaults.instrumentation_key.clone()),
        track_user_id: overrides.track_user_id.unwrap_or(defaults.track_user_id),
        track_exceptions: overrides.track_exceptions.unwrap_or(defaults.track_exceptions),
        cloud_role: overrides
            .cloud_role
            .clone()
            .unwrap_or_else(|| defaults.cloud_role.clone()),
        cloud_role_instance: overrides
            .cloud_role_instance
            .clone()
            .unwrap_or_else(|| defaults.cloud_role_instance.clone()),
        excluded_dependency_targets: overrides
            .excluded_dependency_targets
            .clone()
            .unwrap_or_else(|| defaults.excluded_dependency_targets.clone()),
    }
}

/// Locations of the on-disk config layers
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub user: Option<PathBuf>,
    pub project: PathBuf,
    pub local: PathBuf,
}

impl ConfigPaths {
    /// User config under the home directory, project and local under the cwd
    pub fn discover() -> Self {
        let mut paths = Self::rooted_at(Path::new("."));
        paths.user = dirs::home_dir().map(|home| home.join(".pageinsights/config.toml"));
        paths
    }

    /// Project and local config below `root`, no user layer
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            user: None,
            project: root.join(".pageinsights/config.toml"),
            local: root.join(".pageinsights/config.local.toml"),
        }
    }
}

/// Load overrides with precedence:
/// 1. Environment variables (highest priority)
/// 2. Explicit host properties
/// 3. Local config (.pageinsights/config.local.toml)
/// 4. Project config (.pageinsights/config.toml)
/// 5. User config (~/.pageinsights/config.toml)
///
/// Anything still unset falls back to the defaults in [`resolve`].
pub fn load_overrides(
    paths: &ConfigPaths,
    properties: Option<ConfigOverrides>,
) -> Result<ConfigOverrides, ConfigError> {
    let mut merged = ConfigOverrides::default();

    if let Some(user_config) = &paths.user {
        if user_config.exists() {
            match ConfigOverrides::from_toml_file(user_config) {
                Ok(cfg) => merged.merge(cfg),
                Err(e) => warn!(error = %e, "skipping user config"),
            }
        }
    }

    if paths.project.exists() {
        merged.merge(ConfigOverrides::from_toml_file(&paths.project)?);
    }

    if paths.local.exists() {
        match ConfigOverrides::from_toml_file(&paths.local) {
            Ok(cfg) => merged.merge(cfg),
            Err(e) => warn!(error = %e, "skipping local config"),
        }
    }

    if let Some(properties) = properties {
        merged.merge(properties);
    }

    apply_env_overrides(&mut merged);

    debug!(?merged, "loaded telemetry overrides");
    Ok(merged)
}

/// Forces `enabled = false`
pub const ENV_TELEMETRY_DISABLED: &str = "PAGEINSIGHTS_TELEMETRY_DISABLED";
/// Universal opt-out, same effect as [`ENV_TELEMETRY_DISABLED`]
pub const ENV_DO_NOT_TRACK: &str = "DO_NOT_TRACK";
pub const ENV_INSTRUMENTATION_KEY: &str = "PAGEINSIGHTS_INSTRUMENTATION_KEY";
pub const ENV_CLOUD_ROLE: &str = "PAGEINSIGHTS_CLOUD_ROLE";
pub const ENV_CLOUD_ROLE_INSTANCE: &str = "PAGEINSIGHTS_CLOUD_ROLE_INSTANCE";

/// Every variable [`load_overrides`] reads
pub const ENV_OVERRIDE_VARS: [&str; 5] = [
    ENV_TELEMETRY_DISABLED,
    ENV_DO_NOT_TRACK,
    ENV_INSTRUMENTATION_KEY,
    ENV_CLOUD_ROLE,
    ENV_CLOUD_ROLE_INSTANCE,
];

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut ConfigOverrides) {
    if env::var(ENV_TELEMETRY_DISABLED).is_ok() || env::var(ENV_DO_NOT_TRACK).is_ok() {
        config.enabled = Some(false);
    }

    if let Ok(key) = env::var(ENV_INSTRUMENTATION_KEY) {
        config.instrumentation_key = Some(key);
    }
    if let Ok(role) = env::var(ENV_CLOUD_ROLE) {
        config.cloud_role = Some(role);
    }
    if let Ok(instance) = env::var(ENV_CLOUD_ROLE_INSTANCE) {
        config.cloud_role_instance = Some(instance);
    }
}
