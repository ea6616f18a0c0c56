//! Shared domains
//!
//! A domain's `internal` flag cannot be changed after creation; a mismatch
//! is reported and left alone.

use crate::config::Config;
use crate::error::SyncError;
use crate::session::Session;
use reconcile::{ApplyResult, ApplySummary, classify};

pub fn reconcile_shared_domains(
    session: &Session,
    config: &Config,
) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let current = platform
        .list_shared_domains()
        .map_err(|e| SyncError::listing("shared domains", e))?;

    let mut classification = classify(&config.shared_domains, current);
    let present = std::mem::take(&mut classification.present);
    let ctx = session.ctx_with_cleanup(config.cleanup.shared_domains);

    let mut summary = classification.apply(
        &ctx,
        |ctx, desired| {
            ctx.gate(
                format!(
                    "create shared domain {} (internal: {})",
                    desired.name, desired.internal
                ),
                || platform.create_shared_domain(&desired.name, desired.internal),
            )
            .map_err(SyncError::resource("shared domain", "create", &desired.name))
        },
        |ctx, domain| {
            ctx.gate(format!("delete shared domain {}", domain.name), || {
                platform.delete_shared_domain(domain)
            })
            .map_err(SyncError::resource("shared domain", "delete", &domain.name))
        },
    )?;

    for (desired, domain) in present {
        if desired.internal == domain.internal {
            summary.add_result(&ApplyResult::NoChange);
        } else {
            log::warn!(
                "shared domain {} has internal={} but internal={} is configured; recreate it to change",
                domain.name,
                domain.internal,
                desired.internal
            );
            summary.add_result(&ApplyResult::Skipped {
                reason: "internal flag differs".to_string(),
            });
        }
    }
    Ok(summary)
}
