//! HTTP action gateway for embedded door controllers.
//!
//! The remote device is assumed to be a small embedded HTTP server that
//! cannot reliably handle concurrent requests, so every request issued
//! through [`ActionGateway`] is serialized behind a single async mutex --
//! door commands, light commands, and state polls all share that queue.
//!
//! Responses are validated against a field/value contract: HTTP 2xx, a
//! JSON body, optionally a named field, optionally an exact field value.
//! Validation failures carry the raw response body so callers can log
//! what the device actually said.

pub mod endpoint;
pub mod error;
pub mod gateway;

pub use endpoint::{CustomHeader, EndpointConfig};
pub use error::Error;
pub use gateway::ActionGateway;

pub use reqwest::Method;
