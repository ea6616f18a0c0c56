//! Desired/current classification
//!
//! Both sides are keyed by [`Named::name`]. Within one side the last item
//! with a given name wins. Output vectors are ordered by name.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, ApplySummary};
use std::collections::BTreeMap;

/// Anything that can be matched by name across desired and current state
pub trait Named {
    /// Key used to match desired against current
    fn name(&self) -> &str;
}

impl<T: Named + ?Sized> Named for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Outcome of diffing a desired collection against a current one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<D, C> {
    /// Desired items with no current counterpart
    pub missing: Vec<D>,
    /// Current items with no desired counterpart
    pub extra: Vec<C>,
    /// Items present on both sides, paired up
    pub present: Vec<(D, C)>,
}

impl<D, C> Classification<D, C> {
    /// Check if there is nothing to create or remove
    pub fn is_converged(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// Create every missing item, then clean up extras if the context allows it
    ///
    /// The first callback error stops the iteration and is returned.
    /// With cleanup disabled `cleanup` is never called and nothing is logged.
    pub fn apply<E, FC, FX>(
        self,
        ctx: &ApplyContext,
        mut create: FC,
        mut cleanup: FX,
    ) -> Result<ApplySummary, E>
    where
        FC: FnMut(&ApplyContext, &D) -> Result<(), E>,
        FX: FnMut(&ApplyContext, &C) -> Result<(), E>,
    {
        let mut summary = ApplySummary {
            no_change: self.present.len(),
            ..ApplySummary::default()
        };

        for item in &self.missing {
            create(ctx, item)?;
            summary.add_result(&ApplyResult::Created);
        }

        if ctx.cleanup {
            for item in &self.extra {
                cleanup(ctx, item)?;
                summary.add_result(&ApplyResult::Removed);
            }
        }

        Ok(summary)
    }
}

/// Split desired and current collections by name
pub fn classify<D, C>(
    desired: impl IntoIterator<Item = D>,
    current: impl IntoIterator<Item = C>,
) -> Classification<D, C>
where
    D: Named,
    C: Named,
{
    let desired: BTreeMap<String, D> = desired
        .into_iter()
        .map(|d| (d.name().to_string(), d))
        .collect();
    let mut current: BTreeMap<String, C> = current
        .into_iter()
        .map(|c| (c.name().to_string(), c))
        .collect();

    let mut missing = Vec::new();
    let mut present = Vec::new();
    for (name, d) in desired {
        match current.remove(&name) {
            Some(c) => present.push((d, c)),
            None => missing.push(d),
        }
    }

    Classification {
        missing,
        extra: current.into_values().collect(),
        present,
    }
}
