//! A `ValueStore` over the ledger: the pending-operation pool that turns
//! submitted operations into candidate chunks for nomination, and applies
//! the chunk the network settles on. Grounded on `data/operation_queue.go`.

pub mod error;
pub mod message;
pub mod operation_queue;

pub use error::QueueError;
pub use message::{ErrorMessage, OperationMessage};
pub use operation_queue::{OperationQueue, QUEUE_LIMIT};
