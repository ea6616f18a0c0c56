//! Backend traits and implementations for the identity service.
//!
//! The production implementation is [`uaa::UaaBackend`], which talks SCIM
//! over HTTP. Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use identity::backend::{Backend, MockBackend};
//! use identity::NewAccount;
//!
//! let mock = MockBackend::new();
//! mock.create_account(&NewAccount::new("alice", "alice@example.com", "uid=alice", "ldap"))
//!     .unwrap();
//!
//! let page = mock.list_page(1).unwrap();
//! assert_eq!(page.accounts.len(), 1);
//! assert_eq!(mock.created().len(), 1);
//! ```

pub mod uaa;

use crate::error::{Error, Result};
use crate::types::{Account, AccountPage, NewAccount};
use std::sync::{Arc, Mutex};

/// Backend trait for the identity service.
pub trait Backend: Send + Sync {
    /// Fetch one page of accounts, starting at the 1-based `start_index`.
    fn list_page(&self, start_index: usize) -> Result<AccountPage>;

    /// Create an account and return it with its assigned guid.
    fn create_account(&self, account: &NewAccount) -> Result<Account>;
}

/// Mock backend for testing without network access.
///
/// Clones share state. Pages hold `page_size` accounts (default 2) so that
/// listings always exercise pagination.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    accounts: Vec<Account>,
    created: Vec<NewAccount>,
    rejected: Vec<String>,
    page_size: usize,
    page_fetches: usize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                accounts: Vec::new(),
                created: Vec::new(),
                rejected: Vec::new(),
                page_size: 2,
                page_fetches: 0,
            })),
        }
    }
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing account.
    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    /// Seed an existing `uaa` account whose guid is `<username>-guid`.
    pub fn add_user(&self, username: &str) {
        self.add_account(Account {
            guid: format!("{username}-guid"),
            username: username.to_string(),
            external_id: username.to_string(),
            email: format!("{username}@example.com"),
            origin: "uaa".to_string(),
        });
    }

    /// Make creation of `username` fail as a service rejection would.
    pub fn reject(&self, username: &str) {
        self.state.lock().unwrap().rejected.push(username.to_string());
    }

    /// Number of accounts per listing page.
    pub fn set_page_size(&self, size: usize) {
        self.state.lock().unwrap().page_size = size.max(1);
    }

    /// Creation requests that reached the backend, in order.
    pub fn created(&self) -> Vec<NewAccount> {
        self.state.lock().unwrap().created.clone()
    }

    /// Number of listing pages served so far.
    pub fn page_fetches(&self) -> usize {
        self.state.lock().unwrap().page_fetches
    }
}

impl Backend for MockBackend {
    fn list_page(&self, start_index: usize) -> Result<AccountPage> {
        let mut state = self.state.lock().unwrap();
        state.page_fetches += 1;
        let skip = start_index.saturating_sub(1);
        let accounts: Vec<Account> = state
            .accounts
            .iter()
            .skip(skip)
            .take(state.page_size)
            .cloned()
            .collect();
        Ok(AccountPage {
            items_per_page: accounts.len(),
            accounts,
            start_index,
            total_results: state.accounts.len(),
        })
    }

    fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let mut state = self.state.lock().unwrap();
        if state.rejected.contains(&account.username) {
            return Err(Error::Rejected {
                username: account.username.clone(),
                message: "rejected by mock".to_string(),
            });
        }
        state.created.push(account.clone());
        let created =
            account
                .clone()
                .into_account(format!("{}-{}-guid", account.username, account.origin));
        state.accounts.push(created.clone());
        Ok(created)
    }
}
