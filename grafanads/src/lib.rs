//! Terraform provider for Grafana data sources

pub mod api;
pub mod config;
pub mod logging;
pub mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tfplug::context::Context;
use tfplug::defaults::EnvDefault;
use tfplug::provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
use tfplug::resource::Resource;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::Diagnostic;
use tfplug::TfplugError;

use config::ProviderConfig;
use resources::data_source_generic::{self, DataSourceGenericResource};

pub struct GrafanaProvider {
    client: Option<api::Client>,
}

impl Default for GrafanaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GrafanaProvider {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Grafana connection settings")
            .attribute(
                AttributeBuilder::new(config::URL, AttributeType::String)
                    .description("Root URL of the Grafana server")
                    .optional()
                    .default(EnvDefault::create_required(config::URL_ENV_VAR))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(config::AUTH, AttributeType::String)
                    .description("API key, or username:password for basic auth")
                    .optional()
                    .sensitive()
                    .default(EnvDefault::create_required(config::AUTH_ENV_VAR))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(config::TIMEOUT, AttributeType::Number)
                    .description("HTTP request timeout in seconds (default 30)")
                    .optional()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Provider for GrafanaProvider {
    fn type_name(&self) -> &str {
        "grafanads"
    }

    async fn schema(&self, _ctx: Context) -> Schema {
        Self::schema_static()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut config = request.config;
        Self::schema_static().apply_defaults(&mut config);

        let resolved = match ProviderConfig::from_config(&config) {
            Ok(resolved) => resolved,
            Err(diagnostics) => return ConfigureProviderResponse { diagnostics },
        };

        let mut diagnostics = vec![];
        match api::Client::with_config(&resolved.auth, &resolved.url, resolved.client) {
            Ok(client) => {
                tracing::debug!("Configured Grafana client for {}", client.base_url());
                self.client = Some(client);
            }
            Err(e) => diagnostics.push(Diagnostic::error(
                format!("Failed to create API client: {}", e),
                "",
            )),
        }

        ConfigureProviderResponse { diagnostics }
    }

    async fn create_resource(&self, name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let client = self
            .client
            .as_ref()
            .ok_or(TfplugError::ProviderNotConfigured)?
            .clone();

        match name {
            data_source_generic::TYPE_NAME => {
                Ok(Box::new(DataSourceGenericResource::new(Arc::new(client))))
            }
            _ => Err(TfplugError::ResourceNotFound(name.to_string())),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: OnceLock<HashMap<String, Schema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                let mut schemas = HashMap::new();
                schemas.insert(
                    data_source_generic::TYPE_NAME.to_string(),
                    DataSourceGenericResource::<api::Client>::schema_static(),
                );
                schemas
            })
            .clone()
    }
}
