//! recsync-memory - In-process record store.
//!
//! [`MemoryStore`] keeps records and subscriptions in memory, evaluates
//! predicates locally, pages results with offset cursors and enforces the
//! save policies the way a remote store would. It backs local development
//! and the test suites of the higher layers.

mod policy;
mod store;

pub use store::MemoryStore;
