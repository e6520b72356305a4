//! Session command handlers: login, logout, status.

use std::io::BufRead;

use dialoguer::Input;
use secrecy::SecretString;
use serde::Serialize;

use metadmin_core::DataAccess;

use crate::cli::LoginArgs;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::Context;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Password from stdin or an interactive prompt.
fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ").map_err(prompt_err)?
    };

    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

pub async fn login(access: &DataAccess, args: LoginArgs, ctx: &Context) -> Result<(), CliError> {
    let email = match args.email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = read_password(args.password_stdin)?;

    output::with_spinner("Signing in…", ctx.quiet, access.login(&email, &password)).await?;

    if !ctx.quiet {
        eprintln!("✓ Signed in as {email}");
    }
    Ok(())
}

pub fn logout(access: &DataAccess, ctx: &Context) -> Result<(), CliError> {
    access.logout()?;
    if !ctx.quiet {
        eprintln!("✓ Signed out");
    }
    Ok(())
}

#[derive(Serialize)]
struct Status {
    profile: String,
    backend: String,
    metadata: Option<String>,
    authenticated: bool,
}

pub fn status(resolved: &Resolved, access: &DataAccess, ctx: &Context) -> Result<(), CliError> {
    let status = Status {
        profile: resolved.profile_name.clone(),
        backend: access.client().base_url().to_string(),
        metadata: resolved
            .profile
            .metadata
            .as_ref()
            .map(|p| p.display().to_string()),
        authenticated: access.session().is_authenticated(),
    };

    let out = output::render_single(
        ctx.format,
        &status,
        |s| {
            let pairs = vec![
                ("Profile".to_owned(), s.profile.clone()),
                ("Backend".to_owned(), s.backend.clone()),
                (
                    "Metadata".to_owned(),
                    s.metadata.clone().unwrap_or_else(|| "(not set)".into()),
                ),
                (
                    "Session".to_owned(),
                    if s.authenticated {
                        "signed in".to_owned()
                    } else {
                        "signed out".to_owned()
                    },
                ),
            ];
            output::key_value_table("Status", &pairs)
        },
        |s| if s.authenticated { "authenticated" } else { "anonymous" }.to_owned(),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}
