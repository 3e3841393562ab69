//! Notes core: pure naming, planning and bookkeeping for a conversion run.
mod job;
mod ledger;
mod sanitize;

pub use job::{
    dedupe_destinations, destination_for, ConversionJob, DirRename, PathResolver, RenamePlan,
};
pub use ledger::{Ledger, LedgerEntry, LedgerSnapshot, Outcome};
pub use sanitize::{is_sanitized, sanitize_dir_name};
