//! Network access to the remote catalog.

mod client;
#[cfg(test)]
pub(crate) mod local_server;

pub use client::{request_headers, CatalogHttpClient, RequestOptions};
