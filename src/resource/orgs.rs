//! Orgs and their quota assignment

use super::unprotected;
use crate::config::{Config, OrgConfig};
use crate::error::SyncError;
use crate::platform::{Org, OrgQuota};
use crate::session::Session;
use reconcile::{ApplyContext, ApplyResult, ApplySummary, classify};

/// Orgs that are never deleted, whatever `[cleanup]` says
pub const PROTECTED_ORGS: &[&str] = &["system"];

pub fn reconcile_orgs(session: &Session, config: &Config) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let quotas = if config.orgs.iter().any(|o| o.quota.is_some()) {
        platform
            .list_org_quotas()
            .map_err(|e| SyncError::listing("org quotas", e))?
    } else {
        Vec::new()
    };

    let protected: Vec<&str> = PROTECTED_ORGS
        .iter()
        .copied()
        .chain(config.cleanup.protected_orgs.iter().map(String::as_str))
        .collect();
    let current = platform
        .list_orgs()
        .map_err(|e| SyncError::listing("orgs", e))?;

    let mut classification = classify(&config.orgs, unprotected(current, &protected));
    let present = std::mem::take(&mut classification.present);
    let ctx = session.ctx_with_cleanup(config.cleanup.orgs);

    let mut summary = classification.apply(
        &ctx,
        |ctx, desired| -> Result<(), SyncError> {
            let name = &desired.name;
            let org = ctx
                .gate_with(
                    format!("create org {name}"),
                    || Org {
                        guid: format!("dry-run-{name}-guid"),
                        name: name.clone(),
                        quota_guid: None,
                    },
                    || platform.create_org(name),
                )
                .map_err(SyncError::resource("org", "create", name))?;
            assign_quota(session, ctx, &org, desired, &quotas)?;
            Ok(())
        },
        |ctx, org| {
            ctx.gate(format!("delete org {}", org.name), || {
                platform.delete_org(org)
            })
            .map_err(SyncError::resource("org", "delete", &org.name))
        },
    )?;

    for (desired, org) in present {
        let result = assign_quota(session, &ctx, &org, desired, &quotas)?;
        summary.add_result(&result);
    }
    Ok(summary)
}

/// Point `org` at its configured quota when it is not already
fn assign_quota(
    session: &Session,
    ctx: &ApplyContext,
    org: &Org,
    desired: &OrgConfig,
    quotas: &[OrgQuota],
) -> Result<ApplyResult, SyncError> {
    let Some(name) = desired.quota.as_deref() else {
        return Ok(ApplyResult::NoChange);
    };
    let Some(quota) = quotas.iter().find(|q| q.name == name) else {
        session.missing(&format!("quota {name} for org {}", org.name), "update-quotas")?;
        return Ok(ApplyResult::Skipped {
            reason: format!("quota {name} does not exist"),
        });
    };
    if org.quota_guid.as_deref() == Some(quota.guid.as_str()) {
        return Ok(ApplyResult::NoChange);
    }

    ctx.gate(format!("assign quota {name} to org {}", org.name), || {
        session.platform.assign_org_quota(org, quota)
    })
    .map_err(SyncError::resource("org", "assign a quota to", &org.name))?;
    Ok(ApplyResult::Modified)
}
