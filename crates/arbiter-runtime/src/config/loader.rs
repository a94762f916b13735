//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`arbiter.{profile}.toml`)
//! 3. Main config file (`arbiter.toml`, or `config.toml`)
//! 4. Environment variables (`ARBITER_*`)
//! 5. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `ARBITER_` prefix with `__` as
//! separator:
//!
//! - `ARBITER_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `ARBITER_PIPELINE__LINE_WIDTH=400` → `pipeline.line_width = 400`
//!
//! # Example
//!
//! ```rust,ignore
//! use arbiter_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/arbiter.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ArbiterConfig;

const ENV_PREFIX: &str = "ARBITER_";
const PROFILE_VAR: &str = "ARBITER_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as aliases.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `ARBITER_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds the user config directory (`~/.config/arbiter`) to search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(config_dir) => self.search_path(config_dir.join("arbiter")),
            None => self,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ArbiterConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ArbiterConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ArbiterConfig = figment.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            line_width = config.pipeline.line_width,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ArbiterConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("arbiter"));
        }
        paths
    }

    /// Searches the search paths for `arbiter.toml` / `config.toml`.
    ///
    /// A profile-specific variant is merged first so the base file can
    /// override it; the first directory with a base file wins.
    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for stem in ["arbiter", "config"] {
                let profile_path =
                    search_path.join(format!("{stem}.{}.toml", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = figment.merge(Toml::file(&profile_path));
                }

                let base_path = search_path.join(format!("{stem}.toml"));
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(&base_path));
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        debug!(
            paths = self.resolve_search_paths().len(),
            "File configuration disabled, using defaults and environment"
        );
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ArbiterConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file (plus environment overrides).
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ArbiterConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, LogLevel};
    use figment::Jail;

    fn loader(jail: &Jail) -> ConfigLoader {
        ConfigLoader::new().search_path(jail.directory())
    }

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|jail| {
            let config = loader(jail).without_env().load().map_err(|e| e.to_string())?;
            assert_eq!(config, ArbiterConfig::default());
            assert_eq!(config.logging.level.as_str(), "info");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "arbiter.toml",
                r#"
                    [logging]
                    level = "debug"
                    format = "pretty"

                    [pipeline]
                    line_width = 200
                    dedup_window_secs = 10
                "#,
            )?;
            jail.set_env("ARBITER_PIPELINE__LINE_WIDTH", "300");

            let config = loader(jail).load().map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.format, LogFormat::Pretty);
            assert_eq!(config.pipeline.line_width, 300);
            assert_eq!(config.pipeline.dedup_window_secs, 10);
            assert_eq!(config.pipeline.preview_len, 23);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_overridden_by_base_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "arbiter.production.toml",
                "[pipeline]\npreview_len = 10\nline_width = 100\n",
            )?;
            jail.create_file("arbiter.toml", "[pipeline]\nline_width = 120\n")?;

            let config = loader(jail)
                .profile("prod")
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.pipeline.preview_len, 10);
            assert_eq!(config.pipeline.line_width, 120);
            Ok(())
        });
    }

    #[test]
    fn test_programmatic_merge_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("ARBITER_LOGGING__LEVEL", "warn");
            let mut overrides = ArbiterConfig::default();
            overrides.logging.level = LogLevel::Trace;

            let config = loader(jail).merge(overrides).load().map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Trace);
            Ok(())
        });
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        Jail::expect_with(|jail| {
            let missing = loader(jail).file("nope.toml").load();
            assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

            jail.create_file("arbiter.yaml", "logging: {}")?;
            let unsupported = loader(jail).file("arbiter.yaml").load();
            assert!(matches!(
                unsupported,
                Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
            ));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        Jail::expect_with(|jail| {
            jail.create_file("arbiter.toml", "[logging]\nlevel = \"loud\"\n")?;
            let result = loader(jail).without_env().load();
            assert!(matches!(result, Err(ConfigError::ParseError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env(PROFILE_VAR, "production");
            assert_eq!(Profile::from_env(), Profile::Production);
            jail.set_env(PROFILE_VAR, "Staging");
            assert_eq!(Profile::from_env(), Profile::Custom("staging".to_string()));
            Ok(())
        });
    }
}
