//! Role membership synchronization
//!
//! Converges who holds one role on one org or space. Desired members come
//! from four sources, processed in a fixed order:
//!
//! 1. directory groups and directory users
//! 2. explicitly named platform accounts
//! 3. federated (SAML) emails
//! 4. removal of whoever is left over
//!
//! Each source *claims* the identities it matches out of the current
//! membership, so an identity satisfied by an earlier source is never
//! revoked and never granted twice. Whatever nobody claimed is extra.

use crate::config::RoleUsers;
use crate::error::SyncError;
use crate::platform::{Role, Target};
use crate::session::Session;
use directory::DirectoryIdentity;
use identity::NewAccount;
use std::collections::{BTreeMap, HashSet};

/// Email domain given to directory users that have no mail attribute
pub const LDAP_EMAIL_DOMAIN: &str = "user.from.ldap.cf";

/// Origin whose accounts are keyed by directory username rather than email
const LDAP_ORIGIN: &str = "ldap";

/// What one role sync did, keyed by lower-cased username
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipReport {
    pub granted: Vec<String>,
    pub revoked: Vec<String>,
    /// Already held the role and were matched by a source
    pub claimed: Vec<String>,
    /// Could not be resolved or provisioned
    pub skipped: Vec<String>,
}

impl MembershipReport {
    pub fn merge(&mut self, other: MembershipReport) {
        self.granted.extend(other.granted);
        self.revoked.extend(other.revoked);
        self.claimed.extend(other.claimed);
        self.skipped.extend(other.skipped);
    }

    pub fn total_changes(&self) -> usize {
        self.granted.len() + self.revoked.len()
    }
}

/// Converge `role` on `target` to `desired`
///
/// Directory accounts are provisioned first, then every explicit username
/// is checked against the updated account index before any grant is
/// issued: one missing account fails the whole role.
pub fn sync_role(
    session: &mut Session,
    target: &Target,
    role: Role,
    desired: &RoleUsers,
) -> Result<MembershipReport, SyncError> {
    log::debug!("syncing {role} in {target}");

    let current: BTreeMap<String, String> = session
        .platform
        .role_members(target, role)
        .map_err(|e| SyncError::listing(format!("{role}s of {target}"), e))?
        .into_iter()
        .map(|m| {
            log::trace!("{} ({}) holds {role} in {target}", m.username, m.origin);
            (m.username.to_lowercase(), m.guid)
        })
        .collect();

    let mut sync = RoleSync {
        session,
        target,
        role,
        current,
        seen: HashSet::new(),
        report: MembershipReport::default(),
    };
    let directory = sync.directory_accounts(desired)?;
    sync.require_accounts(&desired.users)?;
    for (key, guid) in directory {
        sync.claim_or_grant(&key, &guid)?;
    }
    sync.explicit_members(desired)?;
    sync.federated_members(desired)?;
    sync.remove_extra(desired.remove_users)?;

    Ok(sync.report)
}

struct RoleSync<'a> {
    session: &'a mut Session,
    target: &'a Target,
    role: Role,
    /// Unclaimed current members: lower-cased username to user guid
    current: BTreeMap<String, String>,
    /// Keys already handled by an earlier source
    seen: HashSet<String>,
    report: MembershipReport,
}

impl RoleSync<'_> {
    /// Resolve directory sources and provision their accounts
    ///
    /// Returns `(key, guid)` pairs in source order, ready to claim or grant.
    fn directory_accounts(
        &mut self,
        desired: &RoleUsers,
    ) -> Result<Vec<(String, String)>, SyncError> {
        if !desired.uses_directory() {
            return Ok(Vec::new());
        }
        let (target, role) = (self.target, self.role);
        let Some(resolver) = self.session.directory.as_mut() else {
            log::warn!(
                "directory is disabled: ignoring {} ldap groups and {} ldap users for {role} in {target}",
                desired.ldap_groups.len(),
                desired.ldap_users.len()
            );
            return Ok(Vec::new());
        };
        let dir_err = |source| SyncError::Directory {
            target: target.clone(),
            role,
            source,
        };

        let mut identities: Vec<DirectoryIdentity> = Vec::new();
        let mut unresolved = Vec::new();
        for group in &desired.ldap_groups {
            for member in resolver.group_members(group).map_err(dir_err)? {
                match resolver.user_by_member(&member).map_err(dir_err)? {
                    Some(identity) => identities.push(identity),
                    None => unresolved.push(member),
                }
            }
        }
        for user in &desired.ldap_users {
            match resolver.user_by_id(user).map_err(dir_err)? {
                Some(identity) => identities.push(identity),
                None => unresolved.push(user.clone()),
            }
        }
        let origin = resolver.config().origin.clone();

        for member in unresolved {
            log::warn!("directory member {member} not found, skipping for {role} in {target}");
            self.skip(member.to_lowercase());
        }
        let mut accounts = Vec::new();
        for identity in &identities {
            if let Some(account) = self.directory_identity(identity, &origin) {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    fn directory_identity(
        &mut self,
        identity: &DirectoryIdentity,
        origin: &str,
    ) -> Option<(String, String)> {
        let (key, account) = if origin == LDAP_ORIGIN {
            let email = if identity.email.is_empty() {
                format!("{}@{LDAP_EMAIL_DOMAIN}", identity.username)
            } else {
                identity.email.clone()
            };
            (
                identity.username.to_lowercase(),
                NewAccount::new(&identity.username, email, &identity.dn, origin),
            )
        } else {
            let email = identity.email.to_lowercase();
            (
                email.clone(),
                NewAccount::new(&email, &email, &email, origin),
            )
        };

        if key.is_empty() {
            log::warn!(
                "directory entry {} has no {} to key it by, skipping",
                identity.dn,
                if origin == LDAP_ORIGIN { "username" } else { "email" }
            );
            self.skip(identity.dn.to_lowercase());
            return None;
        }
        let guid = self.provision(&key, account)?;
        Some((key, guid))
    }

    /// Fail unless every explicit username has an account
    fn require_accounts(&mut self, usernames: &[String]) -> Result<(), SyncError> {
        let accounts = self
            .session
            .identity
            .accounts()
            .map_err(|e| SyncError::listing("identity service accounts", e))?;
        match usernames.iter().find(|u| !accounts.contains(u)) {
            Some(missing) => Err(SyncError::MissingAccount {
                target: self.target.clone(),
                role: self.role,
                username: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    fn explicit_members(&mut self, desired: &RoleUsers) -> Result<(), SyncError> {
        for username in &desired.users {
            let accounts = self
                .session
                .identity
                .accounts()
                .map_err(|e| SyncError::listing("identity service accounts", e))?;
            let Some(account) = accounts.by_username(username) else {
                return Err(SyncError::MissingAccount {
                    target: self.target.clone(),
                    role: self.role,
                    username: username.clone(),
                });
            };
            let guid = account.guid.clone();
            self.claim_or_grant(&username.to_lowercase(), &guid)?;
        }
        Ok(())
    }

    fn federated_members(&mut self, desired: &RoleUsers) -> Result<(), SyncError> {
        for email in &desired.saml_users {
            let email = email.trim();
            let key = email.to_lowercase();
            let account = NewAccount::new(email, email, email, &self.session.federated_origin);
            if let Some(guid) = self.provision(&key, account) {
                self.claim_or_grant(&key, &guid)?;
            }
        }
        Ok(())
    }

    /// Ensure the account exists; a failure skips the identity for this role
    fn provision(&mut self, key: &str, account: NewAccount) -> Option<String> {
        if self.report.skipped.iter().any(|k| k == key) {
            return None;
        }
        let session = &mut *self.session;
        match session.identity.ensure_account(&session.ctx, account) {
            Ok(guid) => Some(guid),
            Err(source) => {
                let err = SyncError::IdentityProvision {
                    username: key.to_string(),
                    source,
                };
                log::warn!("{err}; skipping for {} in {}", self.role, self.target);
                self.skip(key.to_string());
                None
            }
        }
    }

    fn skip(&mut self, key: String) {
        if !self.report.skipped.contains(&key) {
            self.report.skipped.push(key);
        }
    }

    fn claim_or_grant(&mut self, key: &str, guid: &str) -> Result<(), SyncError> {
        if !self.seen.insert(key.to_string()) {
            return Ok(());
        }
        if self.current.remove(key).is_some() {
            log::debug!("{key} already holds {} in {}", self.role, self.target);
            self.report.claimed.push(key.to_string());
            return Ok(());
        }

        let ctx = self.session.ctx;
        let platform = &self.session.platform;
        let (target, role) = (self.target, self.role);

        // the platform only grants org and space roles to org users
        if role != Role::OrgUser {
            let org = target.org_target();
            ctx.gate(format!("add {key} as org user of {org}"), || {
                platform.grant_role(&org, Role::OrgUser, guid)
            })
            .map_err(|source| SyncError::Membership {
                target: org.clone(),
                role: Role::OrgUser,
                username: key.to_string(),
                source,
            })?;
        }

        ctx.gate(format!("grant {role} to {key} in {target}"), || {
            platform.grant_role(target, role, guid)
        })
        .map_err(|source| SyncError::Membership {
            target: target.clone(),
            role,
            username: key.to_string(),
            source,
        })?;

        self.report.granted.push(key.to_string());
        Ok(())
    }

    /// Revoke every unclaimed member; all revokes are attempted before failing
    fn remove_extra(&mut self, remove_users: bool) -> Result<(), SyncError> {
        if self.current.is_empty() {
            return Ok(());
        }
        let (target, role) = (self.target, self.role);
        if !remove_users {
            let names: Vec<&str> = self.current.keys().map(String::as_str).collect();
            log::info!(
                "not removing {} from {role} in {target}: remove_users is disabled",
                names.join(", ")
            );
            return Ok(());
        }

        let ctx = self.session.ctx;
        let platform = &self.session.platform;
        let mut failures = Vec::new();
        for (username, guid) in std::mem::take(&mut self.current) {
            let result = ctx.gate(format!("revoke {role} from {username} in {target}"), || {
                platform.revoke_role(target, role, &guid)
            });
            match result {
                Ok(()) => self.report.revoked.push(username),
                Err(err) => {
                    log::warn!("could not revoke {role} from {username} in {target}: {err}");
                    failures.push(format!("{username}: {err}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Revoke {
                target: target.clone(),
                role,
                failures,
            })
        }
    }
}
