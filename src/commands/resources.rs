//! Single-kind resource commands: `create-orgs`, `update-quotas`, ...

use super::{connect, failed, load_config};
use crate::Context;
use crate::resource::{self, Reconciler};
use crate::ui;
use anyhow::Result;

pub fn create_orgs(ctx: &Context) -> Result<()> {
    run(ctx, "Orgs", resource::reconcile_orgs)
}

pub fn create_spaces(ctx: &Context) -> Result<()> {
    run(ctx, "Spaces", resource::reconcile_spaces)
}

pub fn update_security_groups(ctx: &Context) -> Result<()> {
    run(ctx, "Security groups", resource::reconcile_security_groups)
}

pub fn update_isolation_segments(ctx: &Context) -> Result<()> {
    run(ctx, "Isolation segments", resource::reconcile_isolation_segments)
}

pub fn update_shared_domains(ctx: &Context) -> Result<()> {
    run(ctx, "Shared domains", resource::reconcile_shared_domains)
}

pub fn update_quotas(ctx: &Context) -> Result<()> {
    run(ctx, "Quotas", resource::reconcile_quotas)
}

fn run(ctx: &Context, title: &str, reconcile: Reconciler) -> Result<()> {
    let config = load_config(ctx)?;
    let session = connect(ctx, &config)?;

    let summary = reconcile(&session, &config)
        .map_err(|e| failed(e, format!("Failed to reconcile {}", title.to_lowercase())))?;

    if !ctx.quiet {
        ui::header(title);
        ui::summary(title, &summary);
    }
    Ok(())
}
