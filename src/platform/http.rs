//! Cloud Controller v3 client
//!
//! Blocking `ureq` calls with a bearer token. Listings follow
//! `pagination.next.href` until the last page before anything is returned.

use super::error::Result;
use super::{
    IsolationSegment, Org, OrgQuota, Platform, QuotaLimits, Role, RoleMember, SecurityGroup,
    SharedDomain, Space, Target,
};
use reconcile::Paginated;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Largest page size the v3 API accepts.
const PER_PAGE: usize = 5000;

pub struct CloudController {
    agent: ureq::Agent,
    api_base: String,
    token: String,
}

impl CloudController {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{path}{sep}per_page={PER_PAGE}", self.api_base)
    }

    fn authorization(&self) -> String {
        format!("bearer {}", self.token)
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::trace!("GET {url}");
        Ok(self
            .agent
            .get(url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .call()?
            .body_mut()
            .read_json()?)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}{path}", self.api_base);
        log::trace!("POST {url}");
        Ok(self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .send_json(body)?
            .body_mut()
            .read_json()?)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<()> {
        let url = format!("{}{path}", self.api_base);
        log::trace!("PATCH {url}");
        self.agent
            .patch(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .send_json(body)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = format!("{}{path}", self.api_base);
        log::trace!("DELETE {url}");
        self.agent
            .delete(&url)
            .header("Authorization", &self.authorization())
            .call()?;
        Ok(())
    }

    fn list_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Page<T>> {
        let first: Page<T> = self.get(&self.url(path))?;
        reconcile::accumulate(first, |href| self.get(href))
    }

    fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        Ok(self.list_pages(path)?.resources)
    }

    fn role_filter(target: &Target, role: Role) -> String {
        let scope = match target {
            Target::Org { .. } => "organization_guids",
            Target::Space { .. } => "space_guids",
        };
        format!(
            "/v3/roles?types={}&{scope}={}",
            role.api_type(),
            target.guid()
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Page<T> {
    #[serde(default)]
    resources: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
    #[serde(default)]
    included: Included,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Default, Deserialize)]
struct Included {
    #[serde(default)]
    users: Vec<UserResource>,
}

impl<T> Paginated for Page<T> {
    fn next_page_token(&self) -> Option<String> {
        self.pagination.next.as_ref().map(|l| l.href.clone())
    }

    fn merge_in(&mut self, other: Self) {
        self.resources.extend(other.resources);
        self.included.users.extend(other.included.users);
        self.pagination = other.pagination;
    }
}

#[derive(Debug, Deserialize)]
struct Resource {
    guid: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    guid: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleResource {
    guid: String,
    relationships: RoleRelationships,
}

#[derive(Debug, Deserialize)]
struct RoleRelationships {
    user: ToOne,
}

#[derive(Debug, Default, Deserialize)]
struct ToOne {
    data: Option<Relation>,
}

#[derive(Debug, Deserialize)]
struct Relation {
    guid: String,
}

#[derive(Debug, Deserialize)]
struct OrgResource {
    guid: String,
    name: String,
    #[serde(default)]
    relationships: OrgRelationships,
}

#[derive(Debug, Default, Deserialize)]
struct OrgRelationships {
    #[serde(default)]
    quota: ToOne,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupResource {
    guid: String,
    name: String,
    #[serde(default)]
    rules: Value,
}

#[derive(Debug, Deserialize)]
struct DomainResource {
    guid: String,
    name: String,
    #[serde(default)]
    internal: bool,
    #[serde(default)]
    relationships: DomainRelationships,
}

#[derive(Debug, Default, Deserialize)]
struct DomainRelationships {
    #[serde(default)]
    organization: ToOne,
}

#[derive(Debug, Deserialize)]
struct QuotaResource {
    guid: String,
    name: String,
    #[serde(default)]
    apps: AppLimits,
    #[serde(default)]
    services: ServiceLimits,
    #[serde(default)]
    routes: RouteLimits,
}

#[derive(Debug, Default, Deserialize)]
struct AppLimits {
    total_memory_in_mb: Option<i64>,
    per_process_memory_in_mb: Option<i64>,
    total_instances: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ServiceLimits {
    #[serde(default = "paid_default")]
    paid_services_allowed: bool,
    total_service_instances: Option<i64>,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            paid_services_allowed: true,
            total_service_instances: None,
        }
    }
}

const fn paid_default() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct RouteLimits {
    total_routes: Option<i64>,
}

impl From<QuotaResource> for OrgQuota {
    fn from(q: QuotaResource) -> Self {
        Self {
            guid: q.guid,
            name: q.name,
            limits: QuotaLimits {
                total_memory_mb: q.apps.total_memory_in_mb,
                instance_memory_mb: q.apps.per_process_memory_in_mb,
                app_instances: q.apps.total_instances,
                routes: q.routes.total_routes,
                service_instances: q.services.total_service_instances,
                paid_services_allowed: q.services.paid_services_allowed,
            },
        }
    }
}

fn quota_body(limits: &QuotaLimits) -> Value {
    json!({
        "apps": {
            "total_memory_in_mb": limits.total_memory_mb,
            "per_process_memory_in_mb": limits.instance_memory_mb,
            "total_instances": limits.app_instances,
        },
        "services": {
            "paid_services_allowed": limits.paid_services_allowed,
            "total_service_instances": limits.service_instances,
        },
        "routes": {
            "total_routes": limits.routes,
        },
    })
}

/// Role members of one listing, skipping roles whose user was not included
fn members_of(page: Page<RoleResource>) -> Vec<RoleMember> {
    let users: HashMap<String, UserResource> = page
        .included
        .users
        .into_iter()
        .map(|u| (u.guid.clone(), u))
        .collect();

    page.resources
        .into_iter()
        .filter_map(|role| {
            let guid = role.relationships.user.data?.guid;
            match users.get(&guid) {
                Some(user) => Some(RoleMember {
                    username: user.username.clone().unwrap_or_else(|| guid.clone()),
                    origin: user.origin.clone().unwrap_or_default(),
                    guid,
                }),
                None => {
                    log::warn!("role {} refers to user {guid} that was not returned", role.guid);
                    None
                }
            }
        })
        .collect()
}

impl Platform for CloudController {
    fn role_members(&self, target: &Target, role: Role) -> Result<Vec<RoleMember>> {
        let path = format!("{}&include=user", Self::role_filter(target, role));
        Ok(members_of(self.list_pages(&path)?))
    }

    fn grant_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()> {
        let scope = match target {
            Target::Org { .. } => "organization",
            Target::Space { .. } => "space",
        };
        let mut body = json!({
            "type": role.api_type(),
            "relationships": { "user": { "data": { "guid": user_guid } } },
        });
        body["relationships"][scope] = json!({ "data": { "guid": target.guid() } });
        match self.post::<Value>("/v3/roles", &body) {
            Ok(_) => Ok(()),
            // 422: the user already holds the role
            Err(err) if role == Role::OrgUser && err.status() == Some(422) => {
                log::debug!("{user_guid} is already an org user of {target}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn revoke_role(&self, target: &Target, role: Role, user_guid: &str) -> Result<()> {
        let path = format!("{}&user_guids={user_guid}", Self::role_filter(target, role));
        let roles: Vec<Resource> = self.list(&path)?;
        if roles.is_empty() {
            log::debug!("{user_guid} no longer holds {role} in {target}");
        }
        for r in roles {
            self.delete(&format!("/v3/roles/{}", r.guid))?;
        }
        Ok(())
    }

    fn list_orgs(&self) -> Result<Vec<Org>> {
        let orgs: Vec<OrgResource> = self.list("/v3/organizations")?;
        Ok(orgs
            .into_iter()
            .map(|o| Org {
                guid: o.guid,
                name: o.name,
                quota_guid: o.relationships.quota.data.map(|d| d.guid),
            })
            .collect())
    }

    fn create_org(&self, name: &str) -> Result<Org> {
        let created: Resource = self.post("/v3/organizations", &json!({ "name": name }))?;
        Ok(Org {
            guid: created.guid,
            name: created.name,
            quota_guid: None,
        })
    }

    fn delete_org(&self, org: &Org) -> Result<()> {
        self.delete(&format!("/v3/organizations/{}", org.guid))
    }

    fn assign_org_quota(&self, org: &Org, quota: &OrgQuota) -> Result<()> {
        let body = json!({ "data": [{ "guid": org.guid }] });
        self.post::<Value>(
            &format!("/v3/organization_quotas/{}/relationships/organizations", quota.guid),
            &body,
        )?;
        Ok(())
    }

    fn list_spaces(&self, org: &Org) -> Result<Vec<Space>> {
        let spaces: Vec<Resource> =
            self.list(&format!("/v3/spaces?organization_guids={}", org.guid))?;
        Ok(spaces
            .into_iter()
            .map(|s| Space {
                guid: s.guid,
                name: s.name,
            })
            .collect())
    }

    fn create_space(&self, org: &Org, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "relationships": { "organization": { "data": { "guid": org.guid } } },
        });
        self.post::<Value>("/v3/spaces", &body)?;
        Ok(())
    }

    fn delete_space(&self, space: &Space) -> Result<()> {
        self.delete(&format!("/v3/spaces/{}", space.guid))
    }

    fn list_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let groups: Vec<SecurityGroupResource> = self.list("/v3/security_groups")?;
        Ok(groups
            .into_iter()
            .map(|g| SecurityGroup {
                guid: g.guid,
                name: g.name,
                rules: g.rules,
            })
            .collect())
    }

    fn create_security_group(&self, name: &str, rules: &Value) -> Result<()> {
        self.post::<Value>("/v3/security_groups", &json!({ "name": name, "rules": rules }))?;
        Ok(())
    }

    fn update_security_group(&self, group: &SecurityGroup, rules: &Value) -> Result<()> {
        self.patch(
            &format!("/v3/security_groups/{}", group.guid),
            &json!({ "rules": rules }),
        )
    }

    fn delete_security_group(&self, group: &SecurityGroup) -> Result<()> {
        self.delete(&format!("/v3/security_groups/{}", group.guid))
    }

    fn list_isolation_segments(&self) -> Result<Vec<IsolationSegment>> {
        let segments: Vec<Resource> = self.list("/v3/isolation_segments")?;
        Ok(segments
            .into_iter()
            .map(|s| IsolationSegment {
                guid: s.guid,
                name: s.name,
            })
            .collect())
    }

    fn create_isolation_segment(&self, name: &str) -> Result<()> {
        self.post::<Value>("/v3/isolation_segments", &json!({ "name": name }))?;
        Ok(())
    }

    fn delete_isolation_segment(&self, segment: &IsolationSegment) -> Result<()> {
        self.delete(&format!("/v3/isolation_segments/{}", segment.guid))
    }

    fn list_shared_domains(&self) -> Result<Vec<SharedDomain>> {
        let domains: Vec<DomainResource> = self.list("/v3/domains")?;
        Ok(domains
            .into_iter()
            .filter(|d| d.relationships.organization.data.is_none())
            .map(|d| SharedDomain {
                guid: d.guid,
                name: d.name,
                internal: d.internal,
            })
            .collect())
    }

    fn create_shared_domain(&self, name: &str, internal: bool) -> Result<()> {
        self.post::<Value>("/v3/domains", &json!({ "name": name, "internal": internal }))?;
        Ok(())
    }

    fn delete_shared_domain(&self, domain: &SharedDomain) -> Result<()> {
        self.delete(&format!("/v3/domains/{}", domain.guid))
    }

    fn list_org_quotas(&self) -> Result<Vec<OrgQuota>> {
        let quotas: Vec<QuotaResource> = self.list("/v3/organization_quotas")?;
        Ok(quotas.into_iter().map(OrgQuota::from).collect())
    }

    fn create_org_quota(&self, name: &str, limits: &QuotaLimits) -> Result<()> {
        let mut body = quota_body(limits);
        body["name"] = json!(name);
        self.post::<Value>("/v3/organization_quotas", &body)?;
        Ok(())
    }

    fn update_org_quota(&self, quota: &OrgQuota, limits: &QuotaLimits) -> Result<()> {
        self.patch(
            &format!("/v3/organization_quotas/{}", quota.guid),
            &quota_body(limits),
        )
    }
}
