//! # Offset Client
//!
//! Client core for the carbon-offset marketplace. Resolves listing price
//! ranges, builds and submits listing/purchase batches, and tracks the
//! resulting ledger transactions to completion.
//!
//! ## Collaborators
//! - `POST /price` - pricing oracle
//! - `GET /offsets/txn` - transaction status service
//! - `GET /offsets`, `GET /conversion` - marketplace data
//! - [`ChainBinding`] - wallet that signs and submits the on-chain call

pub mod api;
pub mod config;
mod error;
pub mod marketplace;
pub mod metrics;
pub mod oracle;
pub mod poller;
pub mod session;
pub mod status;
pub mod tracker;
pub mod workflow;

pub use api::ApiClient;
pub use config::Config;
pub use error::Error;
pub use marketplace::Marketplace;
pub use oracle::{HttpPriceOracle, PriceOracle};
pub use poller::StatusPoller;
pub use session::{FileSessionStore, MemorySessionStore, SessionState, SessionStore};
pub use status::{HttpStatusSource, StatusSource};
pub use tracker::{TransactionStore, TransactionTracker};
pub use workflow::{validate_listing_price, ChainBinding, Submitted, Workflow};
