//! Storefront API: endpoints, wire payloads and the order model.

mod client;
mod endpoints;
mod payloads;
mod types;

pub use client::StorefrontApi;
pub use endpoints::Endpoint;
pub use payloads::*;
pub use types::*;
