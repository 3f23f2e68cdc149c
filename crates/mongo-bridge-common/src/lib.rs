//! Common utilities for mongo-bridge
//!
//! This crate provides the error vocabulary shared by the mongo-bridge crates.

pub mod error;
pub mod http;

pub use error::{BridgeError, DatabaseError, Result};
pub use http::HttpStatus;
