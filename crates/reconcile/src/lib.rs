//! # Reconcile
//!
//! The generic half of a declarative reconciler.
//!
//! This crate knows nothing about organizations, spaces or users. It provides
//! the primitives every resource kind is converged with:
//!
//! ## Core Concepts
//!
//! - **Classification**: desired vs current named collections split into
//!   `missing` (create) and `extra` (eligible for cleanup)
//! - **ApplyContext**: carries the dry-run flag and gates every mutation
//! - **Paginated**: merges cursor-paged listings into one complete collection
//! - **Rule matching**: order-insensitive structural JSON equality
//!
//! ## Example
//!
//! ```
//! use reconcile::{ApplyContext, Named, classify};
//!
//! struct Segment(String);
//!
//! impl Named for Segment {
//!     fn name(&self) -> &str {
//!         &self.0
//!     }
//! }
//!
//! let desired = vec![Segment("iso-a".into()), Segment("iso-b".into())];
//! let current = vec![Segment("iso-b".into()), Segment("iso-c".into())];
//!
//! let classification = classify(desired, current);
//! assert_eq!(classification.missing.len(), 1);
//! assert_eq!(classification.extra.len(), 1);
//!
//! let ctx = ApplyContext::new(true).with_cleanup(true);
//! let summary = classification
//!     .apply(
//!         &ctx,
//!         |ctx, s| ctx.gate(format!("create isolation segment {}", s.0), || Ok::<_, String>(())),
//!         |ctx, s| ctx.gate(format!("delete isolation segment {}", s.0), || Ok::<_, String>(())),
//!     )
//!     .unwrap();
//! assert_eq!(summary.created, 1);
//! assert_eq!(summary.removed, 1);
//! ```

pub mod classify;
pub mod context;
pub mod error;
pub mod paginate;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use classify::{Classification, Named, classify};
pub use context::{ApplyContext, DRY_RUN_PREFIX};
pub use error::{Error, Result};
pub use paginate::{Paginated, accumulate};
pub use rules::{ArrayMode, MatchOptions, structurally_equal, values_equal};
pub use types::{ApplyResult, ApplySummary};
