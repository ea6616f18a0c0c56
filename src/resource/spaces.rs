//! Spaces of every configured org

use crate::config::Config;
use crate::error::SyncError;
use crate::session::Session;
use reconcile::{ApplySummary, classify};

pub fn reconcile_spaces(session: &Session, config: &Config) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let orgs = platform
        .list_orgs()
        .map_err(|e| SyncError::listing("orgs", e))?;
    let ctx = session.ctx_with_cleanup(config.cleanup.spaces);
    let mut summary = ApplySummary::default();

    for org_config in &config.orgs {
        let Some(org) = orgs.iter().find(|o| o.name == org_config.name) else {
            session.missing(&format!("org {}", org_config.name), "create-orgs")?;
            continue;
        };
        let current = platform
            .list_spaces(org)
            .map_err(|e| SyncError::listing(format!("spaces of org {}", org.name), e))?;

        let org_summary = classify(&org_config.spaces, current).apply(
            &ctx,
            |ctx, desired| {
                ctx.gate(format!("create space {}/{}", org.name, desired.name), || {
                    platform.create_space(org, &desired.name)
                })
                .map_err(SyncError::resource("space", "create", &desired.name))
            },
            |ctx, space| {
                ctx.gate(format!("delete space {}/{}", org.name, space.name), || {
                    platform.delete_space(space)
                })
                .map_err(SyncError::resource("space", "delete", &space.name))
            },
        )?;
        summary.merge(&org_summary);
    }
    Ok(summary)
}
