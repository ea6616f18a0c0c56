//! Org and space role entry points
//!
//! Walk the configured orgs and spaces, look each one up on the platform
//! once, and hand every role to the membership synchronizer.

use super::membership::{MembershipReport, sync_role};
use crate::config::Config;
use crate::error::SyncError;
use crate::platform::{Org, Role, Target};
use crate::session::Session;

/// Sync org managers, auditors and billing managers of every configured org
pub fn sync_org_users(
    session: &mut Session,
    config: &Config,
) -> Result<MembershipReport, SyncError> {
    let orgs = list_orgs(session)?;
    let mut report = MembershipReport::default();

    for org_config in &config.orgs {
        let Some(org) = orgs.iter().find(|o| o.name == org_config.name) else {
            session.missing(&format!("org {}", org_config.name), "create-orgs")?;
            continue;
        };
        let target = Target::org(&org.guid, &org.name);
        for (role, users) in [
            (Role::OrgManager, &org_config.managers),
            (Role::OrgAuditor, &org_config.auditors),
            (Role::OrgBillingManager, &org_config.billing_managers),
        ] {
            report.merge(sync_role(session, &target, role, users)?);
        }
    }
    Ok(report)
}

/// Sync space developers, managers and auditors of every configured space
pub fn sync_space_users(
    session: &mut Session,
    config: &Config,
) -> Result<MembershipReport, SyncError> {
    let orgs = list_orgs(session)?;
    let mut report = MembershipReport::default();

    for org_config in config.orgs.iter().filter(|o| !o.spaces.is_empty()) {
        let Some(org) = orgs.iter().find(|o| o.name == org_config.name) else {
            session.missing(&format!("org {}", org_config.name), "create-orgs")?;
            continue;
        };
        let spaces = session
            .platform
            .list_spaces(org)
            .map_err(|e| SyncError::listing(format!("spaces of org {}", org.name), e))?;

        for space_config in &org_config.spaces {
            let Some(space) = spaces.iter().find(|s| s.name == space_config.name) else {
                session.missing(
                    &format!("space {}/{}", org.name, space_config.name),
                    "create-spaces",
                )?;
                continue;
            };
            let target = Target::space(&space.guid, &space.name, &org.guid, &org.name);
            for (role, users) in [
                (Role::SpaceDeveloper, &space_config.developers),
                (Role::SpaceManager, &space_config.managers),
                (Role::SpaceAuditor, &space_config.auditors),
            ] {
                report.merge(sync_role(session, &target, role, users)?);
            }
        }
    }
    Ok(report)
}

fn list_orgs(session: &Session) -> Result<Vec<Org>, SyncError> {
    session
        .platform
        .list_orgs()
        .map_err(|e| SyncError::listing("orgs", e))
}
