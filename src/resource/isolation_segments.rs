//! Isolation segments

use super::unprotected;
use crate::config::Config;
use crate::error::SyncError;
use crate::session::Session;
use reconcile::{ApplySummary, classify};

/// The platform's default segment, never deleted
pub const PROTECTED_ISOLATION_SEGMENTS: &[&str] = &["shared"];

pub fn reconcile_isolation_segments(
    session: &Session,
    config: &Config,
) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let current = platform
        .list_isolation_segments()
        .map_err(|e| SyncError::listing("isolation segments", e))?;

    let ctx = session.ctx_with_cleanup(config.cleanup.isolation_segments);
    classify(
        &config.isolation_segments,
        unprotected(current, PROTECTED_ISOLATION_SEGMENTS),
    )
    .apply(
        &ctx,
        |ctx, desired| {
            ctx.gate(format!("create isolation segment {}", desired.name), || {
                platform.create_isolation_segment(&desired.name)
            })
            .map_err(SyncError::resource("isolation segment", "create", &desired.name))
        },
        |ctx, segment| {
            ctx.gate(format!("delete isolation segment {}", segment.name), || {
                platform.delete_isolation_segment(segment)
            })
            .map_err(SyncError::resource("isolation segment", "delete", &segment.name))
        },
    )
}
