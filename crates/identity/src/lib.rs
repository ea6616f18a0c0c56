//! # Identity
//!
//! Account lookup and provisioning against the platform's identity service.
//!
//! A [`Provisioner`] lists every account once per run (following every
//! page), keeps the result as an [`AccountIndex`], and creates accounts that
//! are missing from it. Created accounts, and the placeholders handed out
//! under dry-run, are added to the index so later lookups in the same run
//! see them.
//!
//! ```
//! use identity::backend::MockBackend;
//! use identity::{NewAccount, Provisioner};
//! use reconcile::ApplyContext;
//!
//! let mock = MockBackend::new();
//! mock.add_user("alice");
//!
//! let mut provisioner = Provisioner::with_backend(Box::new(mock.clone()));
//! let ctx = ApplyContext::new(true);
//!
//! let guid = provisioner
//!     .ensure_account(&ctx, NewAccount::new("bob", "bob@example.com", "uid=bob", "ldap"))
//!     .unwrap();
//! assert_eq!(guid, "dry-run-bob-ldap-guid");
//! assert!(mock.created().is_empty());
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{Account, AccountIndex, AccountPage, NewAccount};

use backend::Backend;
use backend::uaa::UaaBackend;
use reconcile::ApplyContext;

/// Run-scoped account cache and creator.
pub struct Provisioner {
    backend: Box<dyn Backend>,
    index: Option<AccountIndex>,
}

impl Provisioner {
    /// Provisioner talking SCIM to the UAA at `api_base`.
    pub fn new(api_base: &str, token: &str) -> Self {
        Self::with_backend(Box::new(UaaBackend::new(api_base, token)))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            index: None,
        }
    }

    /// The complete account index, listed on first use.
    pub fn accounts(&mut self) -> Result<&AccountIndex> {
        Ok(self.load()?)
    }

    /// Guid of the account named `account.username`, creating it if needed.
    ///
    /// Existing accounts are matched case-insensitively by username and
    /// returned without validation. Under dry-run nothing is created and a
    /// `dry-run-<username>-<origin>-guid` placeholder is returned.
    pub fn ensure_account(&mut self, ctx: &ApplyContext, account: NewAccount) -> Result<String> {
        if let Some(existing) = self.load()?.by_username(&account.username) {
            return Ok(existing.guid.clone());
        }

        account.validate()?;

        let backend = &self.backend;
        let created = ctx.gate_with(
            format!(
                "create account {} with origin {}",
                account.username, account.origin
            ),
            || account.clone().into_account(account.placeholder_guid()),
            || backend.create_account(&account),
        )?;

        let guid = created.guid.clone();
        self.load()?.insert(created);
        Ok(guid)
    }

    fn load(&mut self) -> Result<&mut AccountIndex> {
        if self.index.is_none() {
            let index = self.list_all()?;
            log::debug!("identity service has {} accounts", index.len());
            self.index = Some(index);
        }
        match self.index.as_mut() {
            Some(index) => Ok(index),
            None => Err(Error::InvalidResponse("account index unavailable".into())),
        }
    }

    fn list_all(&self) -> Result<AccountIndex> {
        let first = self.backend.list_page(1)?;
        let all = reconcile::accumulate(first, |token| {
            let start: usize = token
                .parse()
                .map_err(|_| Error::InvalidResponse(format!("bad page start index {token}")))?;
            self.backend.list_page(start)
        })?;
        Ok(AccountIndex::new(all.accounts))
    }
}
