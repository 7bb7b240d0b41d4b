//! Grafana HTTP API client

pub mod client;
pub mod datasource;
pub mod error;

#[cfg(test)]
mod test_helpers;

pub use client::{Client, ClientConfig, Credentials};
pub use datasource::{DataSourceApi, DataSourceGeneric, JsonData, JsonValue};
pub use error::ApiError;
