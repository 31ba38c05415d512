//! Errors raised while admitting operations into the pending pool.

use thiserror::Error;

use fbc_ledger::LedgerError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
