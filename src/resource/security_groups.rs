//! Application security groups
//!
//! Rules are compared structurally. A rule list returned in another order,
//! or with `80` rendered as `80.0`, is not drift.

use super::unprotected;
use crate::config::Config;
use crate::error::SyncError;
use crate::session::Session;
use reconcile::{ApplyResult, ApplySummary, MatchOptions, classify, values_equal};
use serde_json::Value;

/// Platform-managed groups that are never updated or deleted
pub const PROTECTED_SECURITY_GROUPS: &[&str] =
    &["default_security_group", "public_networks", "dns"];

pub fn reconcile_security_groups(
    session: &Session,
    config: &Config,
) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let current = platform
        .list_security_groups()
        .map_err(|e| SyncError::listing("security groups", e))?;

    let mut classification = classify(
        &config.security_groups,
        unprotected(current, PROTECTED_SECURITY_GROUPS),
    );
    let present = std::mem::take(&mut classification.present);
    let ctx = session.ctx_with_cleanup(config.cleanup.security_groups);

    let mut summary = classification.apply(
        &ctx,
        |ctx, desired| {
            let rules = Value::Array(desired.rules.clone());
            ctx.gate(format!("create security group {}", desired.name), || {
                platform.create_security_group(&desired.name, &rules)
            })
            .map_err(SyncError::resource("security group", "create", &desired.name))
        },
        |ctx, group| {
            ctx.gate(format!("delete security group {}", group.name), || {
                platform.delete_security_group(group)
            })
            .map_err(SyncError::resource("security group", "delete", &group.name))
        },
    )?;

    let opts = MatchOptions::default();
    for (desired, group) in present {
        let rules = Value::Array(desired.rules.clone());
        if values_equal(&rules, &group.rules, &opts) {
            summary.add_result(&ApplyResult::NoChange);
            continue;
        }
        ctx.gate(format!("update rules of security group {}", group.name), || {
            platform.update_security_group(&group, &rules)
        })
        .map_err(SyncError::resource("security group", "update", &group.name))?;
        summary.add_result(&ApplyResult::Modified);
    }
    Ok(summary)
}
