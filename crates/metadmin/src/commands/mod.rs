//! Command dispatch: bridges CLI args -> generic views -> output formatting.

pub mod config_cmd;
pub mod entities;
pub mod services;
pub mod session;
pub mod util;

use std::sync::Arc;

use crate::cli::{Command, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::StderrNotifier;

/// Output settings resolved once per invocation.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
    pub color: bool,
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, resolved: &Resolved, ctx: &Context) -> Result<(), CliError> {
    let session = resolved.session()?;
    let notifier = Arc::new(StderrNotifier::new(ctx.color, ctx.quiet));
    let access = resolved.data_access(session, notifier)?;

    match cmd {
        // Session commands work without metadata
        Command::Login(args) => session::login(&access, args, ctx).await,
        Command::Logout => session::logout(&access, ctx),
        Command::Status => session::status(resolved, &access, ctx),

        cmd => {
            let app = resolved.load_registry()?;
            let view = entities::Views {
                app: &app,
                access: &access,
                profile: &resolved.profile_name,
                ctx,
            };
            match cmd {
                Command::Services => services::handle(&app, ctx),
                Command::Fields(target) => entities::fields(&app, &target, ctx),
                Command::List(args) => view.list(args).await,
                Command::Get(args) => view.get(args).await,
                Command::Add(args) => view.add(args).await,
                Command::Edit(args) => view.edit(args).await,
                Command::Open { path } => view.open(&path).await,
                // Handled above or before dispatch
                Command::Login(_)
                | Command::Logout
                | Command::Status
                | Command::Config(_)
                | Command::Completions(_) => unreachable!(),
            }
        }
    }
}
