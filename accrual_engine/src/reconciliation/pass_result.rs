use std::fmt::Display;

/// Tallies for a single reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassResult {
    /// Orders the authority was asked about.
    pub examined: usize,
    /// Orders whose status was changed.
    pub updated: usize,
    /// Orders the authority reported in the status they already had.
    pub unchanged: usize,
    /// Orders the authority has no record of yet.
    pub unknown: usize,
    /// Lookups or status writes that failed. These orders are retried on the next tick.
    pub failures: usize,
    /// The authority rate-limited us and the rest of the pass was abandoned.
    pub rate_limited: bool,
    /// The pass stopped early because the worker is shutting down.
    pub cancelled: bool,
}

impl PassResult {
    pub fn is_complete(&self) -> bool {
        !self.rate_limited && !self.cancelled
    }
}

impl Display for PassResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} examined, {} updated, {} unchanged, {} unknown, {} failed",
            self.examined, self.updated, self.unchanged, self.unknown, self.failures
        )?;
        if self.rate_limited {
            write!(f, " (rate limited)")?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}
