//! UAA SCIM backend.
//!
//! Lists and creates accounts through the identity service's SCIM `/Users`
//! endpoint with a bearer token.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Account, AccountPage, NewAccount};
use serde::{Deserialize, Serialize};

/// Accounts requested per listing page.
const PAGE_SIZE: usize = 500;

/// SCIM backend for a UAA server.
///
/// # Example
///
/// ```no_run
/// use identity::backend::uaa::UaaBackend;
/// use identity::backend::Backend;
///
/// let backend = UaaBackend::new("https://uaa.example.com", "token");
/// let page = backend.list_page(1).unwrap();
/// println!("{} accounts", page.total_results);
/// ```
pub struct UaaBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// UAA base URL.
    api_base: String,
    /// Bearer token.
    token: String,
}

impl UaaBackend {
    #[must_use]
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn users_url(&self) -> String {
        format!("{}/Users", self.api_base)
    }

    fn authorization(&self) -> String {
        format!("bearer {}", self.token)
    }
}

impl Backend for UaaBackend {
    fn list_page(&self, start_index: usize) -> Result<AccountPage> {
        let url = format!(
            "{}?startIndex={start_index}&count={PAGE_SIZE}",
            self.users_url()
        );
        log::debug!("listing accounts: {url}");

        let response: ScimList = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .call()?
            .body_mut()
            .read_json()?;

        Ok(AccountPage {
            items_per_page: response.items_per_page.unwrap_or(response.resources.len()),
            accounts: response.resources.into_iter().map(Account::from).collect(),
            start_index: response.start_index,
            total_results: response.total_results,
        })
    }

    fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let body = ScimNewUser {
            user_name: &account.username,
            external_id: &account.external_id,
            origin: &account.origin,
            emails: vec![ScimEmail {
                value: account.email.clone(),
                primary: true,
            }],
        };

        let created: ScimUser = self
            .agent
            .post(&self.users_url())
            .header("Accept", "application/json")
            .header("Authorization", &self.authorization())
            .send_json(&body)
            .map_err(|e| match Error::from(e) {
                Error::Http {
                    status: Some(status @ (400 | 409)),
                    ..
                } => Error::Rejected {
                    username: account.username.clone(),
                    message: format!("HTTP {status}"),
                },
                other => other,
            })?
            .body_mut()
            .read_json()?;

        if created.id.is_empty() {
            return Err(Error::InvalidResponse(format!(
                "created account {} has no id",
                account.username
            )));
        }
        Ok(created.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScimList {
    #[serde(default)]
    resources: Vec<ScimUser>,
    #[serde(default = "one")]
    start_index: usize,
    items_per_page: Option<usize>,
    #[serde(default)]
    total_results: usize,
}

const fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScimUser {
    #[serde(default)]
    id: String,
    user_name: String,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    emails: Vec<ScimEmail>,
    #[serde(default)]
    origin: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScimEmail {
    value: String,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScimNewUser<'a> {
    user_name: &'a str,
    external_id: &'a str,
    origin: &'a str,
    emails: Vec<ScimEmail>,
}

impl From<ScimUser> for Account {
    fn from(user: ScimUser) -> Self {
        let email = user
            .emails
            .iter()
            .find(|e| e.primary)
            .or_else(|| user.emails.first())
            .map(|e| e.value.clone())
            .unwrap_or_default();
        Self {
            guid: user.id,
            username: user.user_name,
            external_id: user.external_id.unwrap_or_default(),
            email,
            origin: user.origin.unwrap_or_default(),
        }
    }
}
