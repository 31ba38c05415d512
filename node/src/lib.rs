//! Wires a `Chain` and its `OperationQueue` into a routable node, with the
//! wire envelope peers speak over. Grounded on the reference
//! implementation's `network` and `util` packages.

pub mod config;
pub mod data_message;
pub mod error;
pub mod message;
pub mod node;
pub mod query;
pub mod signed_message;

pub use config::{NodeConfig, QuorumConfig};
pub use data_message::DataMessage;
pub use error::{NodeError, NodeResult};
pub use message::Message;
pub use node::{Node, MINT_PHRASE};
pub use query::{BucketQuery, DocumentQuery, ProviderQuery, QueryMessage};
pub use signed_message::{Frame, SignedMessage};
