//! `apply`: every step, in dependency order
//!
//! Quotas come before orgs (orgs reference them), orgs before spaces, and
//! the platform-wide resources before any role is granted. A failing step
//! stops the run.

use super::{connect, failed, load_config};
use crate::Context;
use crate::engine;
use crate::resource::{self, Reconciler};
use crate::ui;
use anyhow::Result;
use reconcile::ApplySummary;

const STEPS: [(&str, Reconciler); 6] = [
    ("Quotas", resource::reconcile_quotas),
    ("Orgs", resource::reconcile_orgs),
    ("Spaces", resource::reconcile_spaces),
    ("Isolation segments", resource::reconcile_isolation_segments),
    ("Shared domains", resource::reconcile_shared_domains),
    ("Security groups", resource::reconcile_security_groups),
];

pub fn run(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let mut session = connect(ctx, &config)?;
    let total = STEPS.len() + 2;
    let show = !ctx.quiet;

    if show {
        ui::header("Applying Configuration");
    }

    let mut resources = ApplySummary::default();
    for (i, (title, reconcile)) in STEPS.iter().enumerate() {
        if show {
            ui::step(i + 1, total, title);
        }
        let summary = reconcile(&session, &config).map_err(|e| {
            failed(e, format!("Failed to reconcile {}", title.to_lowercase()))
        })?;
        if show {
            ui::summary(title, &summary);
        }
        resources.merge(&summary);
    }

    if show {
        ui::step(total - 1, total, "Org roles");
    }
    let org_roles = engine::sync_org_users(&mut session, &config)
        .map_err(|e| failed(e, "Failed to sync org roles"))?;
    if show {
        ui::membership("org roles", &org_roles);
        ui::step(total, total, "Space roles");
    }
    let space_roles = engine::sync_space_users(&mut session, &config)
        .map_err(|e| failed(e, "Failed to sync space roles"))?;

    if show {
        ui::membership("space roles", &space_roles);
        println!();
        let changes =
            resources.total_changes() + org_roles.total_changes() + space_roles.total_changes();
        if changes == 0 {
            ui::success("Already converged");
        } else if ctx.dry_run {
            ui::info(&format!("Apply would make {changes} changes"));
        } else {
            ui::success(&format!("Apply complete: {changes} changes"));
        }
    }
    Ok(())
}
