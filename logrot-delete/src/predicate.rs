//! Deletion predicates.

use chrono::{DateTime, Utc};

use crate::pattern::MatchedEntry;

/// Decides whether a matched entry should be deleted.
///
/// Implemented for any `Fn(&MatchedEntry) -> bool`, so closures can be
/// passed wherever a predicate is expected.
pub trait EntryPredicate {
    fn evaluate(&self, entry: &MatchedEntry) -> bool;
}

impl<F> EntryPredicate for F
where
    F: Fn(&MatchedEntry) -> bool,
{
    fn evaluate(&self, entry: &MatchedEntry) -> bool {
        self(entry)
    }
}

/// Which timestamp of an entry its age is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBasis {
    /// The time parsed from the file name. Entries without one fall back to
    /// their modification time.
    FilenameTime,
    /// The filesystem modification time.
    ModifiedTime,
}

/// Selects entries strictly older than a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OlderThan {
    basis: AgeBasis,
    cutoff: DateTime<Utc>,
}

impl OlderThan {
    pub fn new(basis: AgeBasis, cutoff: DateTime<Utc>) -> Self {
        Self { basis, cutoff }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// The timestamp this predicate compares for `entry`.
    pub fn entry_time(&self, entry: &MatchedEntry) -> DateTime<Utc> {
        match self.basis {
            AgeBasis::FilenameTime => entry.filename_time.unwrap_or_else(|| entry.modified()),
            AgeBasis::ModifiedTime => entry.modified(),
        }
    }
}

impl EntryPredicate for OlderThan {
    fn evaluate(&self, entry: &MatchedEntry) -> bool {
        self.entry_time(entry) < self.cutoff
    }
}
