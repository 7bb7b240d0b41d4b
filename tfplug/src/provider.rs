//! Provider trait
//!
//! A provider is configured once, then acts as a factory for resources. The
//! factory hands each resource whatever the configure step produced (API
//! clients, credentials) through the resource's constructor.

use crate::context::Context;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::types::{Diagnostic, DynamicValue};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by every resource type name of this provider
    fn type_name(&self) -> &str;

    /// Schema of the provider configuration block
    async fn schema(&self, ctx: Context) -> Schema;

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Build the resource registered under `name`.
    /// Fails before configure has succeeded or for unknown names.
    async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>>;

    async fn resource_schemas(&self) -> HashMap<String, Schema>;
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
}
