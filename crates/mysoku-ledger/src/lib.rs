//! Transactional side of the pipeline: TSV manifests, the rename/copy
//! ledger with durable rollback entries, and restore-from-manifest.

mod error;
pub use error::LedgerError;

pub mod ledger;
pub mod manifest;
pub mod rollback;

pub use ledger::{Destination, LedgerEntry, ProcessResult, ProcessStatus, TransactionLedger};
pub use manifest::ErrorRecord;
pub use rollback::{restore, RestoreSummary};
