//! `update-org-users` and `update-space-users`

use super::{connect, failed, load_config};
use crate::Context;
use crate::engine;
use crate::ui;
use anyhow::Result;

pub fn update_org_users(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let mut session = connect(ctx, &config)?;

    let report = engine::sync_org_users(&mut session, &config)
        .map_err(|e| failed(e, "Failed to sync org roles"))?;

    if !ctx.quiet {
        ui::header("Org Roles");
        ui::membership("org roles", &report);
    }
    Ok(())
}

pub fn update_space_users(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let mut session = connect(ctx, &config)?;

    let report = engine::sync_space_users(&mut session, &config)
        .map_err(|e| failed(e, "Failed to sync space roles"))?;

    if !ctx.quiet {
        ui::header("Space Roles");
        ui::membership("space roles", &report);
    }
    Ok(())
}
