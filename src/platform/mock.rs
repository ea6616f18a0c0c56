//! In-memory platform for tests
//!
//! Clones share state. Every mutation is appended to `calls()` as a short
//! line such as `grant space developer bob-guid in space acme/dev`, so tests
//! can assert both the effect and the absence of calls under dry-run.

use super::error::{PlatformError, Result};
use super::{
    IsolationSegment, Org, OrgQuota, Platform, QuotaLimits, Role, RoleMember, SecurityGroup,
    SharedDomain, Space, Target,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    users: HashMap<String, String>,
    members: HashMap<(String, Role), Vec<RoleMember>>,
    orgs: Vec<Org>,
    spaces: HashMap<String, Vec<Space>>,
    security_groups: Vec<SecurityGroup>,
    isolation_segments: Vec<IsolationSegment>,
    shared_domains: Vec<SharedDomain>,
    quotas: Vec<OrgQuota>,
    failing: HashSet<String>,
    failing_lists: bool,
    calls: Vec<String>,
    next_guid: usize,
}

impl MockState {
    fn guid(&mut self, prefix: &str) -> String {
        self.next_guid += 1;
        format!("{prefix}-{}", self.next_guid)
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.contains(key) {
            return Err(PlatformError::http("HTTP 500", Some(500)));
        }
        Ok(())
    }

    fn check_list(&self) -> Result<()> {
        if self.failing_lists {
            return Err(PlatformError::http("HTTP 503", Some(503)));
        }
        Ok(())
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a username for a user guid, used when a grant adds a member
    pub fn add_user(&self, guid: &str, username: &str) {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(guid.to_string(), username.to_string());
    }

    /// Seed a current role member
    pub fn add_member(&self, target: &Target, role: Role, guid: &str, username: &str) {
        self.add_user(guid, username);
        self.state
            .lock()
            .unwrap()
            .members
            .entry((target.guid().to_string(), role))
            .or_default()
            .push(RoleMember {
                guid: guid.to_string(),
                username: username.to_string(),
                origin: String::new(),
            });
    }

    pub fn members(&self, target: &Target, role: Role) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .members
            .get(&(target.guid().to_string(), role))
            .map(|m| m.iter().map(|m| m.username.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn add_org(&self, guid: &str, name: &str) -> Org {
        let org = Org {
            guid: guid.to_string(),
            name: name.to_string(),
            quota_guid: None,
        };
        self.state.lock().unwrap().orgs.push(org.clone());
        org
    }

    pub fn add_space(&self, org: &Org, guid: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .spaces
            .entry(org.guid.clone())
            .or_default()
            .push(Space {
                guid: guid.to_string(),
                name: name.to_string(),
            });
    }

    pub fn add_security_group(&self, name: &str, rules: Value) {
        let mut state = self.state.lock().unwrap();
        let guid = state.guid("asg");
        state.security_groups.push(SecurityGroup {
            guid,
            name: name.to_string(),
            rules,
        });
    }

    pub fn add_isolation_segment(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let guid = state.guid("iso");
        state.isolation_segments.push(IsolationSegment {
            guid,
            name: name.to_string(),
        });
    }

    pub fn add_shared_domain(&self, name: &str, internal: bool) {
        let mut state = self.state.lock().unwrap();
        let guid = state.guid("domain");
        state.shared_domains.push(SharedDomain {
            guid,
            name: name.to_string(),
            internal,
        });
    }

    pub fn add_quota(&self, guid: &str, name: &str, limits: QuotaLimits) {
        self.state.lock().unwrap().quotas.push(OrgQuota {
            guid: guid.to_string(),
            name: name.to_string(),
            limits,
        });
    }

    /// Make the mutation named by `key` (a user guid or resource name) fail
    pub fn fail_on(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    /// Make every listing fail
    pub fn fail_listings(&self) {
        self.state.lock().unwrap().failing_lists = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn org_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.orgs.iter().map(|o| o.name.clone()).collect()
    }

    pub fn quotas(&self) -> Vec<OrgQuota> {
        self.state.lock().unwrap().quotas.clone()
    }

    pub fn security_groups(&self) -> Vec<SecurityGroup> {
        self.state.lock().unwrap().security_groups.clone()
    }
}

impl Platform for MockPlatform {
    fn role_members(&self, target: &Target, role: Role) -> Result<Vec<RoleMember>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state
            .members
            .get(&(target.guid().to_string(), role))
            .cloned()
            .unwrap_or_default())
    }

    fn grant_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(user_guid)?;
        state
            .calls
            .push(format!("grant {role} {user_guid} in {target}"));
        let username = state
            .users
            .get(user_guid)
            .cloned()
            .unwrap_or_else(|| user_guid.to_string());
        let members = state
            .members
            .entry((target.guid().to_string(), role))
            .or_default();
        if !members.iter().any(|m| m.guid == user_guid) {
            members.push(RoleMember {
                guid: user_guid.to_string(),
                username,
                origin: String::new(),
            });
        }
        Ok(())
    }

    fn revoke_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(user_guid)?;
        state
            .calls
            .push(format!("revoke {role} {user_guid} in {target}"));
        if let Some(members) = state.members.get_mut(&(target.guid().to_string(), role)) {
            members.retain(|m| m.guid != user_guid);
        }
        Ok(())
    }

    fn list_orgs(&self) -> Result<Vec<Org>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.orgs.clone())
    }

    fn create_org(&self, name: &str) -> Result<Org> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state.calls.push(format!("create org {name}"));
        let org = Org {
            guid: state.guid("org"),
            name: name.to_string(),
            quota_guid: None,
        };
        state.orgs.push(org.clone());
        Ok(org)
    }

    fn delete_org(&self, org: &Org) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&org.name)?;
        state.calls.push(format!("delete org {}", org.name));
        state.orgs.retain(|o| o.guid != org.guid);
        Ok(())
    }

    fn assign_org_quota(&self, org: &Org, quota: &OrgQuota) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("assign quota {} to org {}", quota.name, org.name));
        if let Some(o) = state.orgs.iter_mut().find(|o| o.guid == org.guid) {
            o.quota_guid = Some(quota.guid.clone());
        }
        Ok(())
    }

    fn list_spaces(&self, org: &Org) -> Result<Vec<Space>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.spaces.get(&org.guid).cloned().unwrap_or_default())
    }

    fn create_space(&self, org: &Org, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state
            .calls
            .push(format!("create space {}/{name}", org.name));
        let guid = state.guid("space");
        state
            .spaces
            .entry(org.guid.clone())
            .or_default()
            .push(Space {
                guid,
                name: name.to_string(),
            });
        Ok(())
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&space.name)?;
        state.calls.push(format!("delete space {}", space.name));
        for spaces in state.spaces.values_mut() {
            spaces.retain(|s| s.guid != space.guid);
        }
        Ok(())
    }

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.security_groups.clone())
    }

    fn create_security_group(&self, name: &str, rules: &Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state.calls.push(format!("create security group {name}"));
        let guid = state.guid("asg");
        state.security_groups.push(SecurityGroup {
            guid,
            name: name.to_string(),
            rules: rules.clone(),
        });
        Ok(())
    }

    fn update_security_group(&self, group: &SecurityGroup, rules: &Value) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&group.name)?;
        state
            .calls
            .push(format!("update security group {}", group.name));
        if let Some(g) = state
            .security_groups
            .iter_mut()
            .find(|g| g.guid == group.guid)
        {
            g.rules = rules.clone();
        }
        Ok(())
    }

    fn delete_security_group(&self, group: &SecurityGroup) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&group.name)?;
        state
            .calls
            .push(format!("delete security group {}", group.name));
        state.security_groups.retain(|g| g.guid != group.guid);
        Ok(())
    }

    fn list_isolation_segments(&self) -> Result<Vec<IsolationSegment>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.isolation_segments.clone())
    }

    fn create_isolation_segment(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state.calls.push(format!("create isolation segment {name}"));
        let guid = state.guid("iso");
        state.isolation_segments.push(IsolationSegment {
            guid,
            name: name.to_string(),
        });
        Ok(())
    }

    fn delete_isolation_segment(&self, segment: &IsolationSegment) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&segment.name)?;
        state
            .calls
            .push(format!("delete isolation segment {}", segment.name));
        state.isolation_segments.retain(|s| s.guid != segment.guid);
        Ok(())
    }

    fn list_shared_domains(&self) -> Result<Vec<SharedDomain>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.shared_domains.clone())
    }

    fn create_shared_domain(&self, name: &str, internal: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state
            .calls
            .push(format!("create shared domain {name} internal={internal}"));
        let guid = state.guid("domain");
        state.shared_domains.push(SharedDomain {
            guid,
            name: name.to_string(),
            internal,
        });
        Ok(())
    }

    fn delete_shared_domain(&self, domain: &SharedDomain) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&domain.name)?;
        state
            .calls
            .push(format!("delete shared domain {}", domain.name));
        state.shared_domains.retain(|d| d.guid != domain.guid);
        Ok(())
    }

    fn list_org_quotas(&self) -> Result<Vec<OrgQuota>> {
        let state = self.state.lock().unwrap();
        state.check_list()?;
        Ok(state.quotas.clone())
    }

    fn create_org_quota(&self, name: &str, limits: &QuotaLimits) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(name)?;
        state.calls.push(format!("create quota {name}"));
        let guid = state.guid("quota");
        state.quotas.push(OrgQuota {
            guid,
            name: name.to_string(),
            limits: limits.clone(),
        });
        Ok(())
    }

    fn update_org_quota(&self, quota: &OrgQuota, limits: &QuotaLimits) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check(&quota.name)?;
        state.calls.push(format!("update quota {}", quota.name));
        if let Some(q) = state.quotas.iter_mut().find(|q| q.guid == quota.guid) {
            q.limits = limits.clone();
        }
        Ok(())
    }
}
