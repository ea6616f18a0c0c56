//! Org quota definitions
//!
//! Quotas are created and updated but never deleted: an org may still
//! reference one the configuration no longer names.

use crate::config::Config;
use crate::error::SyncError;
use crate::session::Session;
use reconcile::{ApplyResult, ApplySummary, classify};

pub fn reconcile_quotas(session: &Session, config: &Config) -> Result<ApplySummary, SyncError> {
    let platform = &session.platform;
    let current = platform
        .list_org_quotas()
        .map_err(|e| SyncError::listing("org quotas", e))?;

    let mut classification = classify(&config.quotas, current);
    let present = std::mem::take(&mut classification.present);
    let ctx = session.ctx_with_cleanup(false);

    let mut summary = classification.apply(
        &ctx,
        |ctx, desired| {
            ctx.gate(format!("create quota {}", desired.name), || {
                platform.create_org_quota(&desired.name, &desired.limits)
            })
            .map_err(SyncError::resource("quota", "create", &desired.name))
        },
        |_, _| Ok(()),
    )?;

    for (desired, quota) in present {
        if desired.limits == quota.limits {
            summary.add_result(&ApplyResult::NoChange);
            continue;
        }
        log::debug!(
            "quota {} differs: {:?} -> {:?}",
            quota.name,
            quota.limits,
            desired.limits
        );
        ctx.gate(format!("update quota {}", quota.name), || {
            platform.update_org_quota(&quota, &desired.limits)
        })
        .map_err(SyncError::resource("quota", "update", &quota.name))?;
        summary.add_result(&ApplyResult::Modified);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuotaConfig;
    use crate::platform::QuotaLimits;
    use crate::platform::mock::MockPlatform;
    use crate::resource::testing::session;

    fn limits(memory: i64) -> QuotaLimits {
        QuotaLimits {
            total_memory_mb: Some(memory),
            ..QuotaLimits::default()
        }
    }

    fn config(quotas: &[(&str, i64)]) -> Config {
        Config {
            quotas: quotas
                .iter()
                .map(|(name, memory)| QuotaConfig {
                    name: (*name).to_string(),
                    limits: limits(*memory),
                })
                .collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_quotas_created_and_updated() {
        let platform = MockPlatform::new();
        platform.add_quota("q1", "small", limits(1024));
        platform.add_quota("q2", "medium", limits(4096));

        let config = config(&[("small", 2048), ("medium", 4096), ("large", 8192)]);
        let summary = reconcile_quotas(&session(&platform, false), &config).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.no_change, 1);
        assert_eq!(platform.calls(), vec!["create quota large", "update quota small"]);
        assert_eq!(platform.quotas()[0].limits, limits(2048));
    }

    #[test]
    fn test_unlisted_quota_never_deleted() {
        let platform = MockPlatform::new();
        platform.add_quota("q1", "legacy", limits(1024));

        let mut config = config(&[]);
        config.cleanup.orgs = true;
        let summary = reconcile_quotas(&session(&platform, false), &config).unwrap();
        assert_eq!(summary.total(), 0);
        assert_eq!(platform.quotas().len(), 1);
    }
}
