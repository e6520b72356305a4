//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, SessionStoreKind};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Helpers ─────────────────────────────────────────────────────────

fn store_name(kind: SessionStoreKind) -> &'static str {
    match kind {
        SessionStoreKind::File => "file",
        SessionStoreKind::Keyring => "keyring",
    }
}

/// Format config as TOML-ish text, profiles sorted by name.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "notify_on_error = {}", cfg.defaults.notify_on_error);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if let Some(ref path) = p.metadata {
            let _ = writeln!(out, "metadata = \"{}\"", path.display());
        }
        let _ = writeln!(out, "session_store = \"{}\"", store_name(p.session_store));
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(notify) = p.notify_on_error {
            let _ = writeln!(out, "notify_on_error = {notify}");
        }
        for o in &p.overrides {
            let _ = writeln!(out, "# override {}/{}", o.service, o.entity);
        }
    }

    out
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Apply one `config set` assignment to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "host" => {
            if value.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "host cannot be empty".into(),
                });
            }
            profile.host = value;
        }
        "port" => {
            let port: u16 = parse_flag("port", &value, "must be a port number (1-65535)")?;
            if port == 0 {
                return Err(CliError::Validation {
                    field: "port".into(),
                    reason: "must be a port number (1-65535)".into(),
                });
            }
            profile.port = port;
        }
        "metadata" => profile.metadata = Some(PathBuf::from(value)),
        "session_store" | "session-store" => {
            profile.session_store = match value.as_str() {
                "file" => SessionStoreKind::File,
                "keyring" => SessionStoreKind::Keyring,
                _ => {
                    return Err(CliError::Validation {
                        field: "session_store".into(),
                        reason: "must be 'file' or 'keyring'".into(),
                    });
                }
            };
        }
        "timeout" => {
            profile.timeout = Some(parse_flag("timeout", &value, "must be a number (seconds)")?);
        }
        "notify_on_error" | "notify-on-error" => {
            profile.notify_on_error = Some(parse_flag(
                "notify_on_error",
                &value,
                "must be 'true' or 'false'",
            )?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, port, metadata, \
                     session_store, timeout, notify_on_error"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts, ctx: &Context) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("metadmin configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(config::DEFAULT_PROFILE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Backend host")
                .default("localhost".into())
                .interact_text()
                .map_err(prompt_err)?;

            let port: u16 = Input::new()
                .with_prompt("Backend port")
                .default(8080)
                .interact_text()
                .map_err(prompt_err)?;

            let metadata: String = Input::new()
                .with_prompt("Metadata file (leave empty to set later)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let store_choices = &[
                "Session file in the data directory",
                "System keyring",
            ];
            let session_store = match Select::new()
                .with_prompt("Where to keep the signed-in session?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => SessionStoreKind::File,
                _ => SessionStoreKind::Keyring,
            };

            let mut profile = Profile {
                host,
                port,
                metadata: None,
                session_store,
                ..Profile::default()
            };
            if !metadata.trim().is_empty() {
                profile.metadata = Some(PathBuf::from(metadata.trim()));
            }

            // Keep other profiles when re-running the wizard
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Sign in: metadmin login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(ctx.format, &cfg, format_config, |_| "config".into());
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), ctx.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            save_config(&cfg)?;
            if !ctx.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg
                .default_profile
                .as_deref()
                .unwrap_or(config::DEFAULT_PROFILE);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: metadmin config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !ctx.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_updates_typed_fields() {
        let mut profile = Profile::default();
        set_key(&mut profile, "port", "9000".into()).unwrap();
        set_key(&mut profile, "session-store", "keyring".into()).unwrap();
        set_key(&mut profile, "notify_on_error", "false".into()).unwrap();
        set_key(&mut profile, "metadata", "/tmp/app.json".into()).unwrap();

        assert_eq!(profile.port, 9000);
        assert_eq!(profile.session_store, SessionStoreKind::Keyring);
        assert_eq!(profile.notify_on_error, Some(false));
        assert_eq!(profile.metadata, Some(PathBuf::from("/tmp/app.json")));
    }

    #[test]
    fn set_key_rejects_bad_values() {
        let mut profile = Profile::default();
        assert!(set_key(&mut profile, "port", "0".into()).is_err());
        assert!(set_key(&mut profile, "port", "http".into()).is_err());
        assert!(set_key(&mut profile, "host", " ".into()).is_err());
        assert!(set_key(&mut profile, "session_store", "cookie".into()).is_err());
        assert!(set_key(&mut profile, "colour", "red".into()).is_err());
    }

    #[test]
    fn formatted_config_lists_profiles_in_order() {
        let mut cfg = Config::default();
        cfg.profiles.insert("staging".into(), Profile::default());
        cfg.profiles.insert("local".into(), Profile::default());

        let text = format_config(&cfg);
        let local = text.find("[profiles.local]").unwrap();
        let staging = text.find("[profiles.staging]").unwrap();
        assert!(local < staging);
        assert!(text.contains("port = 8080"));
        assert!(text.contains("session_store = \"file\""));
    }
}
