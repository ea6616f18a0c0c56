//! Role membership engine
//!
//! - [`membership`] converges one role on one org or space
//! - [`users`] walks the configured orgs and spaces

pub mod membership;
pub mod users;

pub use membership::{MembershipReport, sync_role};
pub use users::{sync_org_users, sync_space_users};
