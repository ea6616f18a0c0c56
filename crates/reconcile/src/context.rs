//! Apply context and the dry-run gate
//!
//! Every mutating call made during reconciliation goes through
//! [`ApplyContext::gate`] or [`ApplyContext::gate_with`]. Under dry-run the
//! operation closure is never invoked: the intended action is logged with the
//! [`DRY_RUN_PREFIX`] and a deterministic success value is returned instead,
//! so callers take exactly the same branches as in a live run.

use std::fmt::Display;

/// Prefix on every log line describing an action skipped by dry-run
pub const DRY_RUN_PREFIX: &str = "[dry-run]: ";

/// Context passed to create/cleanup callbacks and mutating calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyContext {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether extra items may be removed
    pub cleanup: bool,
}

impl ApplyContext {
    /// Create a new apply context with cleanup disabled
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            cleanup: false,
        }
    }

    /// Same context with cleanup toggled
    pub fn with_cleanup(self, cleanup: bool) -> Self {
        Self { cleanup, ..self }
    }

    /// Run a mutation, or log it when in dry-run mode
    pub fn gate<E>(
        &self,
        action: impl Display,
        op: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E> {
        self.gate_with(action, || (), op)
    }

    /// Run a mutation that yields a value
    ///
    /// Under dry-run `placeholder` supplies the value the caller would
    /// otherwise have received (e.g. a synthesized identifier).
    pub fn gate_with<T, E>(
        &self,
        action: impl Display,
        placeholder: impl FnOnce() -> T,
        op: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if self.dry_run {
            log::info!("{DRY_RUN_PREFIX}{action}");
            return Ok(placeholder());
        }
        log::info!("{action}");
        op()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_gate_dry_run_skips_op() {
        let ctx = ApplyContext::new(true);
        let called = Cell::new(false);
        let result: Result<(), String> = ctx.gate("create thing", || {
            called.set(true);
            Ok(())
        });
        assert!(result.is_ok());
        assert!(!called.get());
    }

    #[test]
    fn test_gate_live_runs_op_and_propagates_error() {
        let ctx = ApplyContext::new(false);
        let result: Result<(), String> = ctx.gate("create thing", || Err("boom".into()));
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_gate_with_placeholder() {
        let ctx = ApplyContext::new(true);
        let id: Result<String, String> = ctx.gate_with(
            "create account",
            || "dry-run-guid".to_string(),
            || Ok("real-guid".to_string()),
        );
        assert_eq!(id.unwrap(), "dry-run-guid");

        let live = ApplyContext::new(false);
        let id: Result<String, String> = live.gate_with(
            "create account",
            || "dry-run-guid".to_string(),
            || Ok("real-guid".to_string()),
        );
        assert_eq!(id.unwrap(), "real-guid");
    }

    #[test]
    fn test_with_cleanup() {
        let ctx = ApplyContext::new(false).with_cleanup(true);
        assert!(ctx.cleanup);
        assert!(!ctx.dry_run);
    }
}
