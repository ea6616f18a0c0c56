//! Core types for identity-service accounts.

use crate::error::{Error, Result};
use reconcile::Paginated;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A platform account as known to the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier (the guid role grants refer to).
    pub guid: String,
    /// Login name.
    pub username: String,
    /// Identifier in the vouching system (DN, email, ...).
    #[serde(default)]
    pub external_id: String,
    /// Primary email address.
    #[serde(default)]
    pub email: String,
    /// Which system vouches for the account (`uaa`, `ldap`, `saml`, ...).
    #[serde(default)]
    pub origin: String,
}

/// Request to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub external_id: String,
    pub origin: String,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        external_id: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            external_id: external_id.into(),
            origin: origin.into(),
        }
    }

    /// Reject requests with an empty username, email or external id.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("username", &self.username),
            ("email", &self.email),
            ("externalId", &self.external_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingField {
                    field,
                    username: self.username.clone(),
                });
            }
        }
        Ok(())
    }

    /// Guid handed out in place of a real one when creation is previewed.
    pub fn placeholder_guid(&self) -> String {
        format!("dry-run-{}-{}-guid", self.username, self.origin)
    }

    /// The account this request would produce, under the given guid.
    pub fn into_account(self, guid: String) -> Account {
        Account {
            guid,
            username: self.username,
            external_id: self.external_id,
            email: self.email,
            origin: self.origin,
        }
    }
}

/// One page of a SCIM `/Users` listing.
///
/// SCIM pages by 1-based `startIndex`; the next page starts right after the
/// items this page returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub start_index: usize,
    pub items_per_page: usize,
    pub total_results: usize,
}

impl Paginated for AccountPage {
    fn next_page_token(&self) -> Option<String> {
        if self.items_per_page == 0 {
            return None;
        }
        let next = self.start_index + self.items_per_page;
        (next <= self.total_results).then(|| next.to_string())
    }

    fn merge_in(&mut self, other: Self) {
        self.accounts.extend(other.accounts);
        self.start_index = other.start_index;
        self.items_per_page = other.items_per_page;
        self.total_results = other.total_results;
    }
}

/// Every account of the identity service, indexed for lookups.
///
/// Usernames are matched case-insensitively. Lookups by external id only
/// answer when exactly one account carries that id.
#[derive(Debug, Clone, Default)]
pub struct AccountIndex {
    accounts: Vec<Account>,
    by_username: HashMap<String, usize>,
    by_guid: HashMap<String, usize>,
    by_external_id: HashMap<String, Vec<usize>>,
}

impl AccountIndex {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut index = Self::default();
        for account in accounts {
            index.insert(account);
        }
        index
    }

    /// Add an account; a later account with the same username shadows the earlier one.
    pub fn insert(&mut self, account: Account) {
        let slot = self.accounts.len();
        self.by_username
            .insert(account.username.to_lowercase(), slot);
        self.by_guid.insert(account.guid.clone(), slot);
        if !account.external_id.is_empty() {
            self.by_external_id
                .entry(account.external_id.to_lowercase())
                .or_default()
                .push(slot);
        }
        self.accounts.push(account);
    }

    pub fn by_username(&self, username: &str) -> Option<&Account> {
        self.by_username
            .get(&username.to_lowercase())
            .map(|&i| &self.accounts[i])
    }

    pub fn by_guid(&self, guid: &str) -> Option<&Account> {
        self.by_guid.get(guid).map(|&i| &self.accounts[i])
    }

    pub fn by_external_id(&self, external_id: &str) -> Option<&Account> {
        match self
            .by_external_id
            .get(&external_id.to_lowercase())
            .map(Vec::as_slice)
        {
            Some([only]) => Some(&self.accounts[*only]),
            Some(many) if many.len() > 1 => {
                log::warn!(
                    "{} accounts share external id {external_id}, treating as not found",
                    many.len()
                );
                None
            }
            _ => None,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.by_username.contains_key(&username.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
