//! Import statistics tracking.

use std::fmt;

/// Counts for a single import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Data rows read from the source file
    pub rows_read: usize,
    /// Distinct rows sent in the upsert (after collapsing repeated ids)
    pub records_prepared: usize,
    /// Rows the database reported as inserted or updated
    pub records_upserted: u64,
    /// Rows replaced by a later row carrying the same id
    pub duplicate_ids: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} prepared, {} upserted",
            self.rows_read, self.records_prepared, self.records_upserted
        )?;
        if self.duplicate_ids > 0 {
            write!(f, ", {} repeated ids collapsed", self.duplicate_ids)?;
        }
        Ok(())
    }
}
