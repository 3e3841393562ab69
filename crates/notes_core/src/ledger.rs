use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Which table an outcome lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Converted,
    Failed,
}

/// One recorded outcome.
///
/// `seq` is the 1-based position inside the entry's own table; `order` is the
/// 1-based position across the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub seq: usize,
    pub order: usize,
    pub source: PathBuf,
}

#[derive(Debug, Default)]
struct LedgerState {
    successes: Vec<LedgerEntry>,
    failures: Vec<LedgerEntry>,
}

/// Append-only success and failure tables shared by concurrent conversions.
///
/// Both counters advance under one lock, so no two outcomes ever share a
/// sequence number and no increment is lost.
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

/// Point-in-time copy of both tables, each ordered by `seq`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub successes: Vec<LedgerEntry>,
    pub failures: Vec<LedgerEntry>,
}

impl LedgerSnapshot {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome, source: &Path) -> LedgerEntry {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let order = state.successes.len() + state.failures.len() + 1;
        let table = match outcome {
            Outcome::Converted => &mut state.successes,
            Outcome::Failed => &mut state.failures,
        };
        let entry = LedgerEntry {
            seq: table.len() + 1,
            order,
            source: source.to_path_buf(),
        };
        table.push(entry.clone());
        entry
    }

    pub fn record_success(&self, source: &Path) -> LedgerEntry {
        self.record(Outcome::Converted, source)
    }

    pub fn record_failure(&self, source: &Path) -> LedgerEntry {
        self.record(Outcome::Failed, source)
    }

    pub fn success_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .successes
            .len()
    }

    pub fn failure_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failures
            .len()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        LedgerSnapshot {
            successes: state.successes.clone(),
            failures: state.failures.clone(),
        }
    }
}
