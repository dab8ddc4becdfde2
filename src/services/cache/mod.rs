//! Shared key/value backend. The only consumer is the DPoP replay store.
pub mod client;
pub mod valkey;

pub use client::{CacheClient, CacheError};
pub use valkey::ValkeyClient;
