//! Command implementations
//!
//! Every command loads the config, opens one session and runs one or more
//! reconcilers against it. Nothing is carried over between commands.

pub mod apply;
pub mod resources;
pub mod users;
pub mod validate;

use crate::Context;
use crate::config::Config;
use crate::error::SyncError;
use crate::paths;
use crate::session::Session;
use crate::ui;
use anyhow::{Context as _, Result};

/// Load the config file and overlay secrets from flags or the environment
pub fn load_config(ctx: &Context) -> Result<Config> {
    let path = paths::config_file(ctx.config.as_deref())?;
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_secrets(
        ctx.token.clone(),
        ctx.uaa_token.clone(),
        ctx.ldap_password.clone(),
    );
    Ok(config)
}

/// Open the session every reconciler of one command shares
pub fn connect(ctx: &Context, config: &Config) -> Result<Session> {
    if ctx.dry_run && !ctx.quiet {
        ui::warn("Dry run - no changes will be made");
    }
    Session::connect(config, ctx.dry_run).context("Failed to set up platform session")
}

/// Wrap a reconciler failure for the command line
pub fn failed(err: SyncError, what: impl Into<String>) -> anyhow::Error {
    if err.is_retryable() {
        ui::dim("the failure looks transient; re-running is safe");
    }
    anyhow::Error::new(err).context(what.into())
}
