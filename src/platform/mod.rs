//! Platform API: orgs, spaces, roles and the platform-wide resources
//!
//! [`Platform`] is the seam between the reconcilers and the Cloud
//! Controller. [`http::CloudController`] is the production client; tests use
//! the in-memory `mock::MockPlatform`.

pub mod error;
pub mod http;
#[cfg(test)]
pub mod mock;

pub use error::{PlatformError, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A role that can be granted on an org or a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    OrgUser,
    OrgManager,
    OrgAuditor,
    OrgBillingManager,
    SpaceDeveloper,
    SpaceManager,
    SpaceAuditor,
}

impl Role {
    /// Role type as named by the v3 roles API
    pub fn api_type(self) -> &'static str {
        match self {
            Role::OrgUser => "organization_user",
            Role::OrgManager => "organization_manager",
            Role::OrgAuditor => "organization_auditor",
            Role::OrgBillingManager => "organization_billing_manager",
            Role::SpaceDeveloper => "space_developer",
            Role::SpaceManager => "space_manager",
            Role::SpaceAuditor => "space_auditor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::OrgUser => "org user",
            Role::OrgManager => "org manager",
            Role::OrgAuditor => "org auditor",
            Role::OrgBillingManager => "billing manager",
            Role::SpaceDeveloper => "space developer",
            Role::SpaceManager => "space manager",
            Role::SpaceAuditor => "space auditor",
        };
        f.write_str(name)
    }
}

/// The org or space a role is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Org {
        guid: String,
        name: String,
    },
    Space {
        guid: String,
        name: String,
        org_guid: String,
        org_name: String,
    },
}

impl Target {
    pub fn org(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Target::Org {
            guid: guid.into(),
            name: name.into(),
        }
    }

    pub fn space(
        guid: impl Into<String>,
        name: impl Into<String>,
        org_guid: impl Into<String>,
        org_name: impl Into<String>,
    ) -> Self {
        Target::Space {
            guid: guid.into(),
            name: name.into(),
            org_guid: org_guid.into(),
            org_name: org_name.into(),
        }
    }

    pub fn guid(&self) -> &str {
        match self {
            Target::Org { guid, .. } | Target::Space { guid, .. } => guid,
        }
    }

    /// The org itself, or the org a space belongs to
    pub fn org_target(&self) -> Target {
        match self {
            Target::Org { .. } => self.clone(),
            Target::Space {
                org_guid, org_name, ..
            } => Target::org(org_guid.clone(), org_name.clone()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Org { name, .. } => write!(f, "org {name}"),
            Target::Space { name, org_name, .. } => write!(f, "space {org_name}/{name}"),
        }
    }
}

/// A user holding a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMember {
    pub guid: String,
    pub username: String,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Org {
    pub guid: String,
    pub name: String,
    pub quota_guid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGroup {
    pub guid: String,
    pub name: String,
    pub rules: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationSegment {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDomain {
    pub guid: String,
    pub name: String,
    pub internal: bool,
}

/// Org quota limits; `None` means unlimited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaLimits {
    pub total_memory_mb: Option<i64>,
    pub instance_memory_mb: Option<i64>,
    pub app_instances: Option<i64>,
    pub routes: Option<i64>,
    pub service_instances: Option<i64>,
    pub paid_services_allowed: bool,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            total_memory_mb: None,
            instance_memory_mb: None,
            app_instances: None,
            routes: None,
            service_instances: None,
            paid_services_allowed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgQuota {
    pub guid: String,
    pub name: String,
    pub limits: QuotaLimits,
}

macro_rules! named {
    ($($ty:ty),* $(,)?) => {
        $(impl reconcile::Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

pub(crate) use named;

named!(Org, Space, SecurityGroup, IsolationSegment, SharedDomain, OrgQuota);

/// Blocking access to the platform API
///
/// Every `list_*` call returns the complete collection, all pages merged.
pub trait Platform {
    fn role_members(&self, target: &Target, role: Role) -> Result<Vec<RoleMember>>;
    fn grant_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()>;
    fn revoke_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()>;

    fn list_orgs(&self) -> Result<Vec<Org>>;
    fn create_org(&self, name: &str) -> Result<Org>;
    fn delete_org(&self, org: &Org) -> Result<()>;
    fn assign_org_quota(&self, org: &Org, quota: &OrgQuota) -> Result<()>;

    fn list_spaces(&self, org: &Org) -> Result<Vec<Space>>;
    fn create_space(&self, org: &Org, name: &str) -> Result<()>;
    fn delete_space(&self, space: &Space) -> Result<()>;

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>>;
    fn create_security_group(&self, name: &str, rules: &Value) -> Result<()>;
    fn update_security_group(&self, group: &SecurityGroup, rules: &Value) -> Result<()>;
    fn delete_security_group(&self, group: &SecurityGroup) -> Result<()>;

    fn list_isolation_segments(&self) -> Result<Vec<IsolationSegment>>;
    fn create_isolation_segment(&self, name: &str) -> Result<()>;
    fn delete_isolation_segment(&self, segment: &IsolationSegment) -> Result<()>;

    fn list_shared_domains(&self) -> Result<Vec<SharedDomain>>;
    fn create_shared_domain(&self, name: &str, internal: bool) -> Result<()>;
    fn delete_shared_domain(&self, domain: &SharedDomain) -> Result<()>;

    fn list_org_quotas(&self) -> Result<Vec<OrgQuota>>;
    fn create_org_quota(&self, name: &str, limits: &QuotaLimits) -> Result<()>;
    fn update_org_quota(&self, quota: &OrgQuota, limits: &QuotaLimits) -> Result<()>;
}
