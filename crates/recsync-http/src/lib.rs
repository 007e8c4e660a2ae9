//! recsync-http - HTTP-backed record store.
//!
//! [`HttpStore`] speaks the recsync JSON protocol: reads are GET queries
//! and writes are POST procedures against `{base}/api/{method}`.

mod client;
mod endpoints;
mod store;

pub use client::HttpClient;
pub use store::{HttpStore, HttpStoreBuilder};
