//! `grafanads_data_source_generic` resource implementation

use std::sync::Arc;

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::import_state_passthrough_id;
use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use super::mapper::{
    attr, existing_identity, format_identity, from_resource, parse_identity, to_resource,
    JsonDataGroups, DEFAULT_ACCESS_MODE, JSON_DATA, SECURE_JSON_DATA,
};
use super::DataSourceError;
use crate::api::{DataSourceApi, DataSourceGeneric};

pub const TYPE_NAME: &str = "grafanads_data_source_generic";

pub struct DataSourceGenericResource<C: DataSourceApi> {
    client: Arc<C>,
    schema: Schema,
}

impl<C: DataSourceApi> DataSourceGenericResource<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            schema: Self::schema_static(),
        }
    }

    pub fn schema_static() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a Grafana data source of any plugin type")
            .attribute(
                AttributeBuilder::new(attr::ID, AttributeType::String)
                    .description("Numeric data source id assigned by Grafana")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::NAME, AttributeType::String)
                    .description("Data source name, unique within the organization")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::TYPE, AttributeType::String)
                    .description("Data source plugin id (e.g. prometheus, grafana-mongodb-atlas-datasource)")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::URL, AttributeType::String)
                    .description("Backend URL")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::ACCESS_MODE, AttributeType::String)
                    .description("proxy (server side) or direct (browser)")
                    .optional()
                    .default(StaticDefault::string(DEFAULT_ACCESS_MODE))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::ORG_ID, AttributeType::Number)
                    .description("Owning organization; Grafana picks the caller's when unset")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::BASIC_AUTH_ENABLED, AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::BASIC_AUTH_USERNAME, AttributeType::String)
                    .optional()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::BASIC_AUTH_PASSWORD, AttributeType::String)
                    .optional()
                    .sensitive()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::DATABASE_NAME, AttributeType::String)
                    .optional()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::IS_DEFAULT, AttributeType::Bool)
                    .description("Make this the organization's default data source")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::USERNAME, AttributeType::String)
                    .optional()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(attr::PASSWORD, AttributeType::String)
                    .optional()
                    .sensitive()
                    .default(StaticDefault::string(""))
                    .build(),
            );

        for (groups, sensitive) in [(JSON_DATA, false), (SECURE_JSON_DATA, true)] {
            for (name, element) in typed_groups(groups) {
                let mut attribute = AttributeBuilder::new(name, AttributeType::Map(Box::new(element)))
                    .optional();
                if sensitive {
                    attribute = attribute.sensitive();
                }
                builder = builder.attribute(attribute.build());
            }
        }

        builder.build()
    }

    /// POST the planned data source; the returned state carries the new id
    async fn post_state(&self, planned: DynamicValue) -> Result<DynamicValue, DataSourceError> {
        let mut state = planned;
        self.schema.apply_defaults(&mut state);

        let data_source = to_resource(&state)?;
        let id = self
            .client
            .new_data_source(&data_source)
            .await
            .map_err(DataSourceError::Remote)?;
        tracing::info!("Created data source {} with id {}", data_source.name, id);

        state.set_string(&AttributePath::new(attr::ID), format_identity(id))?;
        Ok(state)
    }

    /// None when Grafana no longer has the data source
    async fn read_state(&self, mut state: DynamicValue) -> Result<Option<DynamicValue>, DataSourceError> {
        let id = existing_identity(&state)?;

        match self.fetch(id).await {
            Ok(data_source) => {
                from_resource(&data_source, &mut state)?;
                Ok(Some(state))
            }
            Err(DataSourceError::NotFound) => {
                let name = state
                    .get_string(&AttributePath::new(attr::NAME))
                    .unwrap_or_else(|_| format_identity(id));
                tracing::warn!(
                    "removing datasource {} from state because it no longer exists in grafana",
                    name
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch(&self, id: i64) -> Result<DataSourceGeneric, DataSourceError> {
        self.client.data_source(id).await.map_err(|e| {
            if e.is_not_found() {
                DataSourceError::NotFound
            } else {
                DataSourceError::Remote(e)
            }
        })
    }

    /// Push planned values; the id is carried over from prior state unchanged
    async fn update_state(
        &self,
        prior: &DynamicValue,
        planned: DynamicValue,
    ) -> Result<DynamicValue, DataSourceError> {
        let id = existing_identity(prior)?;

        let mut state = planned;
        self.schema.apply_defaults(&mut state);
        carry_computed(prior, &mut state)?;
        state.set_string(&AttributePath::new(attr::ID), format_identity(id))?;

        let data_source = to_resource(&state)?;
        self.client
            .update_data_source(&data_source)
            .await
            .map_err(DataSourceError::Remote)?;
        tracing::info!("Updated data source {}", id);

        Ok(state)
    }

    async fn delete_state(&self, prior: &DynamicValue) -> Result<(), DataSourceError> {
        let id = existing_identity(prior)?;

        self.client
            .delete_data_source(id)
            .await
            .map_err(DataSourceError::Remote)?;
        tracing::info!("Deleted data source {}", id);

        Ok(())
    }
}

/// Optional computed attributes left unknown or unset by the plan keep their
/// prior value instead of being sent to Grafana as empty
fn carry_computed(prior: &DynamicValue, planned: &mut DynamicValue) -> tfplug::Result<()> {
    for name in [attr::URL, attr::ORG_ID] {
        let path = AttributePath::new(name);
        let unsettled = matches!(
            planned.get(&path),
            Err(_) | Ok(Dynamic::Null) | Ok(Dynamic::Unknown)
        );
        if !unsettled {
            continue;
        }
        match prior.get(&path) {
            Ok(Dynamic::Null) | Ok(Dynamic::Unknown) | Err(_) => planned.set_null(&path)?,
            Ok(value) => planned.set(&path, value.clone())?,
        }
    }
    Ok(())
}

fn typed_groups(groups: JsonDataGroups) -> [(&'static str, AttributeType); 3] {
    [
        (groups.string, AttributeType::String),
        (groups.bool, AttributeType::Bool),
        (groups.int, AttributeType::Number),
    ]
}

fn error_diagnostic(summary: &str, err: &DataSourceError) -> Diagnostic {
    let diagnostic = Diagnostic::error(summary, err.to_string());
    match err {
        DataSourceError::InvalidIdentity(_) => diagnostic.with_attribute(AttributePath::new(attr::ID)),
        _ => diagnostic,
    }
}

fn validate_required_string(config: &DynamicValue, name: &str, diagnostics: &mut Vec<Diagnostic>) {
    let path = AttributePath::new(name);
    match config.get(&path) {
        Ok(Dynamic::Unknown) => {}
        Ok(Dynamic::String(s)) if !s.is_empty() => {}
        _ => diagnostics.push(
            Diagnostic::error(
                format!("Missing {}", name),
                format!("The '{}' attribute is required and must be a non-empty string", name),
            )
            .with_attribute(path),
        ),
    }
}

fn validate_int_group(config: &DynamicValue, name: &str, diagnostics: &mut Vec<Diagnostic>) {
    let Ok(values) = config.get_map(&AttributePath::new(name)) else {
        return;
    };
    for (key, value) in values {
        if let Dynamic::Number(n) = value {
            if n.fract() != 0.0 {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid integer value",
                        format!("{}[{:?}] must be a whole number, got {}", name, key, n),
                    )
                    .with_attribute(AttributePath::new(name).key(&key)),
                );
            }
        }
    }
}

#[async_trait]
impl<C: DataSourceApi + 'static> Resource for DataSourceGenericResource<C> {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(&self, _ctx: Context) -> Schema {
        self.schema.clone()
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        validate_required_string(&request.config, attr::NAME, &mut diagnostics);
        validate_required_string(&request.config, attr::TYPE, &mut diagnostics);
        validate_int_group(&request.config, JSON_DATA.int, &mut diagnostics);
        validate_int_group(&request.config, SECURE_JSON_DATA.int, &mut diagnostics);

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let posted = match self.post_state(request.planned_state.clone()).await {
            Ok(posted) => posted,
            Err(e) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![error_diagnostic("Failed to create data source", &e)],
                }
            }
        };

        // From here on the data source exists; state must keep its id
        let err = match self.read_state(posted.clone()).await {
            Ok(Some(new_state)) => {
                return CreateResourceResponse {
                    new_state,
                    diagnostics: vec![],
                }
            }
            Ok(None) => DataSourceError::NotFound,
            Err(e) => e,
        };
        CreateResourceResponse {
            new_state: posted,
            diagnostics: vec![error_diagnostic("Failed to read created data source", &err)],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        match self.read_state(request.current_state.clone()).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![error_diagnostic("Failed to read data source", &e)],
            },
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_state(&request.prior_state, request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![error_diagnostic("Failed to update data source", &e)],
            },
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let diagnostics = match self.delete_state(&request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![error_diagnostic("Failed to delete data source", &e)],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<C: DataSourceApi + 'static> ResourceWithImportState for DataSourceGenericResource<C> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();

        if let Err(e) = parse_identity(&request.id) {
            response
                .diagnostics
                .push(error_diagnostic("Failed to import data source", &e));
            return response;
        }

        import_state_passthrough_id(&ctx, AttributePath::new(attr::ID), &request, &mut response);
        response
    }
}
