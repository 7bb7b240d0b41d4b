//! Resource implementations

pub mod data_source_generic;
pub mod error;
pub mod mapper;

pub use data_source_generic::DataSourceGenericResource;
pub use error::DataSourceError;
