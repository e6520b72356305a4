//! CLI configuration -- thin wrapper around `metadmin_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --port, --metadata, --timeout, --output).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tracing::{debug, warn};

use metadmin_core::{AppInfo, BackendConfig, DataAccess, Notifier, SessionContext};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use metadmin_config::{
    Config, DEFAULT_PROFILE, Profile, SessionStoreKind, config_path, load_config_or_default,
    save_config,
};

/// A profile with every flag override applied.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub backend: BackendConfig,
}

// ── Resolution ──────────────────────────────────────────────────────

pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Output format: flag > config default > table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&config.defaults.output, true).unwrap_or_else(|_| {
            warn!(value = %config.defaults.output, "unknown output format in config, using table");
            OutputFormat::Table
        })
    })
}

/// Merge the active profile with CLI flags.
///
/// A missing profile is only an error when it was asked for by name;
/// otherwise flags and built-in defaults stand in for it.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut profile = match config.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => Profile::default(),
    };

    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(ref path) = global.metadata {
        profile.metadata = Some(path.clone());
    }

    let mut backend = metadmin_config::profile_to_backend_config(&profile, &config.defaults)?;
    if let Some(secs) = global.timeout {
        backend.timeout = Duration::from_secs(secs);
    }

    debug!(profile = %profile_name, host = %backend.host, port = backend.port, "profile resolved");
    Ok(Resolved {
        profile_name,
        profile,
        backend,
    })
}

impl Resolved {
    pub fn metadata_path(&self) -> Result<PathBuf, CliError> {
        self.profile
            .metadata
            .clone()
            .ok_or_else(|| CliError::NoMetadata {
                profile: self.profile_name.clone(),
            })
    }

    /// Load, override, and freeze the entity registry.
    pub fn load_registry(&self) -> Result<AppInfo, CliError> {
        let path = self.metadata_path()?;
        Ok(metadmin_config::load_app_info(&path, &self.profile)?)
    }

    /// Session context restored from the profile's store.
    ///
    /// An unreadable store is logged and treated as signed out.
    pub fn session(&self) -> Result<SessionContext, CliError> {
        let store = metadmin_config::session_store(&self.profile_name, &self.profile)?;
        let session = SessionContext::new(store);
        if let Err(e) = session.restore() {
            warn!(error = %e, "stored session could not be read");
        }
        Ok(session)
    }

    pub fn data_access(
        &self,
        session: SessionContext,
        notifier: Arc<dyn Notifier>,
    ) -> Result<DataAccess, CliError> {
        Ok(DataAccess::from_config(&self.backend, session, notifier)?)
    }
}
