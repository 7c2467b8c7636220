//! Storefront transport abstraction.
//!
//! This module provides a `Transport` trait for executing storefront requests,
//! with an HTTP implementation for real use and mocks under `testing`.

mod http;
mod types;

pub use http::HttpTransport;
pub use types::*;
