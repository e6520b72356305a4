//! Shared configuration for the metadmin console.
//!
//! TOML profiles layered with environment variables, config and data
//! paths, session store selection, and translation into
//! `metadmin_core::BackendConfig`. The CLI adds flag-aware wrappers on top;
//! core never reads any of these files itself.

mod keyring_store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use metadmin_core::{
    AppInfo, AppMetadata, BackendConfig, CoreError, EntityOverride, FileSessionStore, SessionStore,
};

pub use keyring_store::{KEYRING_SERVICE, KeyringSessionStore};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.into())
    }
}

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// table | json | json-compact | yaml | plain
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_notify_on_error")]
    pub notify_on_error: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            notify_on_error: default_notify_on_error(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_notify_on_error() -> bool {
    true
}

/// Where a profile keeps its auth session between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    #[default]
    File,
    Keyring,
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Generated service/entity metadata (`.json` or `.toml`).
    pub metadata: Option<PathBuf>,

    #[serde(default)]
    pub session_store: SessionStoreKind,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Override `defaults.notify_on_error`.
    pub notify_on_error: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideConfig>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metadata: None,
            session_store: SessionStoreKind::default(),
            timeout: None,
            notify_on_error: None,
            overrides: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    8080
}

/// Local customization of one generated entity descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideConfig {
    pub service: String,
    pub entity: String,

    /// List columns, in order.
    pub columns: Option<Vec<String>>,

    /// Field whose value names a record in titles and links.
    pub human_name_field: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_fields: Vec<String>,
}

impl From<&OverrideConfig> for EntityOverride {
    fn from(cfg: &OverrideConfig) -> Self {
        let mut ov = EntityOverride::new(&cfg.service, &cfg.entity);
        if let Some(ref columns) = cfg.columns {
            ov = ov.with_list_columns(columns.iter().cloned());
        }
        if let Some(ref field) = cfg.human_name_field {
            ov = ov.with_human_name_field(field.clone());
        }
        for field in &cfg.hidden_fields {
            ov = ov.without_field(field.clone());
        }
        ov
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "metadmin", "metadmin")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding per-profile session files.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("metadmin");
    p
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered as defaults → file → `METADMIN_` env.
///
/// Nested keys use a double underscore in env names, e.g.
/// `METADMIN_PROFILES__DEFAULT__PORT=9000`, so single underscores inside
/// key names survive.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("METADMIN_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile translation ─────────────────────────────────────────────

/// Build a `BackendConfig` from a profile and the global defaults.
pub fn profile_to_backend_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }

    Ok(BackendConfig {
        host: profile.host.clone(),
        port: profile.port,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        notify_on_error: profile.notify_on_error.unwrap_or(defaults.notify_on_error),
    })
}

/// The profile's overrides as core override values.
pub fn overrides(profile: &Profile) -> Vec<EntityOverride> {
    profile.overrides.iter().map(EntityOverride::from).collect()
}

/// Load metadata from `path`, apply the profile's overrides, and freeze.
pub fn load_app_info(path: &Path, profile: &Profile) -> Result<AppInfo, ConfigError> {
    let mut builder = AppMetadata::from_path(path)?.into_builder()?;
    builder.apply_overrides(&overrides(profile))?;
    Ok(builder.freeze()?)
}

/// The persistent session store selected by the profile.
pub fn session_store(
    profile_name: &str,
    profile: &Profile,
) -> Result<Arc<dyn SessionStore>, ConfigError> {
    match profile.session_store {
        SessionStoreKind::File => Ok(Arc::new(FileSessionStore::in_dir(
            &data_dir().join(profile_name),
        ))),
        SessionStoreKind::Keyring => Ok(Arc::new(KeyringSessionStore::new(profile_name)?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "staging"

[defaults]
output = "json"
timeout = 10

[profiles.staging]
host = "api.staging"
port = 9000
metadata = "app.json"
session_store = "keyring"
notify_on_error = false

[[profiles.staging.overrides]]
service = "pharmacy"
entity = "pharmaceutical_company"
columns = ["name", "updated_at"]
human_name_field = "name"
hidden_fields = ["notes"]
"#;

    #[test]
    fn loads_profiles_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.active_profile_name(None), "staging");
        assert_eq!(cfg.defaults.output, "json");

        let profile = &cfg.profiles["staging"];
        assert_eq!(profile.port, 9000);
        assert_eq!(profile.session_store, SessionStoreKind::Keyring);

        let ov = &overrides(profile)[0];
        assert_eq!(ov.service, "pharmacy");
        assert_eq!(
            ov.list_columns.as_deref(),
            Some(["name".to_owned(), "updated_at".to_owned()].as_slice())
        );
        assert!(ov.humanizer.is_some());
        assert_eq!(ov.removed_fields, vec!["notes".to_owned()]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.active_profile_name(None), DEFAULT_PROFILE);
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("METADMIN_PROFILES__STAGING__PORT", "9100");
            jail.set_env("METADMIN_DEFAULTS__NOTIFY_ON_ERROR", "false");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.profiles["staging"].port, 9100);
            assert!(!cfg.defaults.notify_on_error);
            Ok(())
        });
    }

    #[test]
    fn profile_values_win_over_defaults() {
        let profile = Profile {
            timeout: Some(5),
            notify_on_error: Some(false),
            ..Profile::default()
        };
        let backend = profile_to_backend_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(backend.host, "localhost");
        assert_eq!(backend.port, 8080);
        assert_eq!(backend.timeout, Duration::from_secs(5));
        assert!(!backend.notify_on_error);

        let inherited = profile_to_backend_config(&Profile::default(), &Defaults::default()).unwrap();
        assert_eq!(inherited.timeout, Duration::from_secs(30));
        assert!(inherited.notify_on_error);
    }

    #[test]
    fn rejects_empty_host_and_zero_port() {
        let empty_host = Profile {
            host: "  ".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_backend_config(&empty_host, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "host"
        ));

        let zero_port = Profile {
            port: 0,
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_backend_config(&zero_port, &Defaults::default()),
            Err(ConfigError::Validation { ref field, .. }) if field == "port"
        ));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                host: "10.0.0.2".into(),
                metadata: Some(PathBuf::from("/srv/app.toml")),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = &loaded.profiles["default"];
        assert_eq!(profile.host, "10.0.0.2");
        assert_eq!(profile.metadata.as_deref(), Some(Path::new("/srv/app.toml")));
    }

    #[test]
    fn app_info_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = dir.path().join("app.json");
        std::fs::write(
            &metadata,
            r#"{"services": [{"name": "users", "entities": [{"name": "user", "fields": [
                {"name": "email", "kind": "email", "required": true},
                {"name": "notes", "kind": "string"}
            ]}]}]}"#,
        )
        .unwrap();

        let profile = Profile {
            overrides: vec![OverrideConfig {
                service: "users".into(),
                entity: "user".into(),
                columns: Some(vec!["email".into()]),
                human_name_field: None,
                hidden_fields: vec!["notes".into()],
            }],
            ..Profile::default()
        };

        let app = load_app_info(&metadata, &profile).unwrap();
        let user = app.entity_info("users", "user").unwrap();
        assert_eq!(user.list_columns(), ["email".to_owned()].as_slice());
        assert!(user.find_field("notes").is_none());
    }

    #[test]
    fn app_info_reports_bad_override() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = dir.path().join("app.json");
        std::fs::write(
            &metadata,
            r#"{"services": [{"name": "users", "entities": [{"name": "user", "fields": []}]}]}"#,
        )
        .unwrap();

        let profile = Profile {
            overrides: vec![OverrideConfig {
                service: "users".into(),
                entity: "user".into(),
                columns: Some(vec!["nope".into()]),
                human_name_field: None,
                hidden_fields: Vec::new(),
            }],
            ..Profile::default()
        };

        assert!(matches!(
            load_app_info(&metadata, &profile),
            Err(ConfigError::Core(CoreError::InvalidColumn { .. }))
        ));
    }

    #[test]
    fn explicit_profile_wins() {
        let cfg = Config::default();
        assert_eq!(cfg.active_profile_name(Some("work")), "work");
        assert_eq!(cfg.active_profile_name(None), DEFAULT_PROFILE);
    }
}
