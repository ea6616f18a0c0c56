//! Per-kind reconcilers for orgs, spaces and platform-wide resources
//!
//! Each kind follows the same shape:
//! - list the current items (a listing failure is fatal)
//! - drop protected items from the current side
//! - classify desired against current by name
//! - create missing items, clean up extras when `[cleanup]` allows it
//! - update present items whose content differs, where the kind supports it
//!
//! Every mutation goes through the session's dry-run gate.

pub mod isolation_segments;
pub mod orgs;
pub mod quotas;
pub mod security_groups;
pub mod shared_domains;
pub mod spaces;

pub use isolation_segments::reconcile_isolation_segments;
pub use orgs::reconcile_orgs;
pub use quotas::reconcile_quotas;
pub use security_groups::reconcile_security_groups;
pub use shared_domains::reconcile_shared_domains;
pub use spaces::reconcile_spaces;

use crate::config::{
    Config, IsolationSegmentConfig, OrgConfig, QuotaConfig, SecurityGroupConfig, SharedDomainConfig,
    SpaceConfig,
};
use crate::error::SyncError;
use crate::platform::named;
use crate::session::Session;
use reconcile::ApplySummary;

/// Entry point shared by every resource kind
pub type Reconciler = fn(&Session, &Config) -> Result<ApplySummary, SyncError>;

named!(
    OrgConfig,
    SpaceConfig,
    SecurityGroupConfig,
    IsolationSegmentConfig,
    SharedDomainConfig,
    QuotaConfig,
);

/// Drop current items whose name is protected
fn unprotected<T: reconcile::Named>(items: Vec<T>, protected: &[&str]) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| {
            let keep = !protected.contains(&item.name());
            if !keep {
                log::debug!("{} is protected, leaving it alone", item.name());
            }
            keep
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::platform::mock::MockPlatform;
    use crate::session::Session;
    use identity::Provisioner;
    use identity::backend::MockBackend;
    use reconcile::ApplyContext;

    pub fn session(platform: &MockPlatform, dry_run: bool) -> Session {
        Session::new(
            ApplyContext::new(dry_run),
            Box::new(platform.clone()),
            None,
            Provisioner::with_backend(Box::new(MockBackend::new())),
            "saml",
        )
    }
}
