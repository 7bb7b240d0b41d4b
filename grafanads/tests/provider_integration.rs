use grafanads::api::Client;
use grafanads::resources::DataSourceGenericResource;
use grafanads::GrafanaProvider;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tfplug::resource::{
    CreateResourceRequest, DeleteResourceRequest, ImportResourceStateRequest,
    ReadResourceRequest, Resource, ResourceWithImportState, UpdateResourceRequest,
};
use tfplug::types::has_errors;
use tfplug::{
    AttributePath, ConfigureProviderRequest, Context, Dynamic, DynamicValue, Provider,
};

const TYPE_NAME: &str = "grafanads_data_source_generic";

async fn configured_resource(server: &Server) -> Box<dyn Resource> {
    grafanads::logging::try_init_logging();

    let mut config = DynamicValue::object();
    config
        .set_string(&AttributePath::new("url"), server.url())
        .unwrap();
    config
        .set_string(&AttributePath::new("auth"), "admin:admin".to_string())
        .unwrap();

    let mut provider = GrafanaProvider::new();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
            },
        )
        .await;
    assert!(!has_errors(&response.diagnostics));

    provider.create_resource(TYPE_NAME).await.unwrap()
}

fn mongoatlas_config() -> DynamicValue {
    let mut config = DynamicValue::object();
    config
        .set_string(
            &AttributePath::new("name"),
            "mongoatlas-provider-test".to_string(),
        )
        .unwrap();
    config
        .set_string(
            &AttributePath::new("type"),
            "grafana-mongodb-atlas-datasource".to_string(),
        )
        .unwrap();
    config
        .set_number(&AttributePath::new("org_id"), 9.0)
        .unwrap();
    config
        .set(
            &AttributePath::new("json_data_string"),
            Dynamic::Map(
                [
                    ("atlasPublicKey".to_string(), Dynamic::String("xxx".to_string())),
                    ("k".to_string(), Dynamic::String("v1".to_string())),
                ]
                .into(),
            ),
        )
        .unwrap();
    config
        .set(
            &AttributePath::new("json_data_int"),
            Dynamic::Map([("k".to_string(), Dynamic::Number(2.0))].into()),
        )
        .unwrap();
    config
        .set(
            &AttributePath::new("secure_json_string"),
            Dynamic::Map(
                [("atlasPrivateKey".to_string(), Dynamic::String("yyy".to_string()))].into(),
            ),
        )
        .unwrap();
    config
}

fn remote_body(id: i64, url: &str) -> String {
    json!({
        "id": id,
        "uid": "atlas-uid",
        "orgId": 9,
        "name": "mongoatlas-provider-test",
        "type": "grafana-mongodb-atlas-datasource",
        "access": "proxy",
        "url": url,
        "database": "",
        "user": "",
        "basicAuth": false,
        "isDefault": false,
        "jsonData": {"atlasPublicKey": "xxx", "k": 2},
        "secureJsonFields": {"atlasPrivateKey": true},
        "readOnly": false
    })
    .to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn data_source_lifecycle_with_mock_server() {
    let mut server = Server::new_async().await;
    let resource = configured_resource(&server).await;

    let create_mock = server
        .mock("POST", "/api/datasources")
        .match_header("authorization", "Basic YWRtaW46YWRtaW4=")
        .match_body(Matcher::PartialJson(json!({
            "orgId": 9,
            "name": "mongoatlas-provider-test",
            "type": "grafana-mongodb-atlas-datasource",
            "access": "proxy",
            "jsonData": {"atlasPublicKey": "xxx", "k": 2},
            "secureJsonData": {"atlasPrivateKey": "yyy"}
        })))
        .with_body(r#"{"datasource":{},"id":42,"message":"Datasource added","name":"mongoatlas-provider-test"}"#)
        .create_async()
        .await;
    let read_mock = server
        .mock("GET", "/api/datasources/42")
        .with_body(remote_body(42, ""))
        .expect(1)
        .create_async()
        .await;

    let planned = mongoatlas_config();
    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(!has_errors(&created.diagnostics));
    create_mock.assert_async().await;
    read_mock.assert_async().await;

    let state = created.new_state;
    let id = state.get_string(&AttributePath::new("id")).unwrap();
    assert!(!id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(
        state.get_string(&AttributePath::new("name")).unwrap(),
        "mongoatlas-provider-test"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("type")).unwrap(),
        "grafana-mongodb-atlas-datasource"
    );
    assert_eq!(state.get_number(&AttributePath::new("org_id")).unwrap(), 9.0);

    // Update pushes planned values with the same identity and issues no read
    let mut planned = state.clone();
    planned
        .set_string(
            &AttributePath::new("url"),
            "https://cloud.mongodb.com".to_string(),
        )
        .unwrap();
    let update_mock = server
        .mock("PUT", "/api/datasources/42")
        .match_body(Matcher::PartialJson(json!({
            "id": 42,
            "url": "https://cloud.mongodb.com"
        })))
        .with_body(r#"{"message":"Datasource updated","id":42}"#)
        .create_async()
        .await;

    let updated = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                prior_state: state.clone(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(updated.diagnostics.is_empty());
    update_mock.assert_async().await;
    assert_eq!(
        updated.new_state.get_string(&AttributePath::new("id")).unwrap(),
        "42"
    );

    let delete_mock = server
        .mock("DELETE", "/api/datasources/42")
        .with_body(r#"{"message":"Data source deleted"}"#)
        .create_async()
        .await;

    let deleted = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: TYPE_NAME.to_string(),
                prior_state: updated.new_state.clone(),
            },
        )
        .await;

    assert!(deleted.diagnostics.is_empty());
    delete_mock.assert_async().await;
}

#[tokio::test]
async fn read_after_out_of_band_delete_clears_state() {
    let mut server = Server::new_async().await;
    let resource = configured_resource(&server).await;

    let _gone = server
        .mock("GET", "/api/datasources/7")
        .with_status(404)
        .with_body(r#"{"message":"Data source not found"}"#)
        .create_async()
        .await;

    let mut state = DynamicValue::object();
    state
        .set_string(&AttributePath::new("id"), "7".to_string())
        .unwrap();
    state
        .set_string(&AttributePath::new("name"), "ds1".to_string())
        .unwrap();

    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: TYPE_NAME.to_string(),
                current_state: state,
            },
        )
        .await;

    assert!(response.new_state.is_none());
    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn create_surfaces_grafana_conflict() {
    let mut server = Server::new_async().await;
    let resource = configured_resource(&server).await;

    let _conflict = server
        .mock("POST", "/api/datasources")
        .with_status(409)
        .with_body(r#"{"message":"data source with the same name already exists"}"#)
        .create_async()
        .await;

    let planned = mongoatlas_config();
    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(
        response.diagnostics[0].detail,
        "409 Conflict: data source with the same name already exists"
    );
}

#[tokio::test]
async fn import_then_read_populates_state() {
    let mut server = Server::new_async().await;
    let _read = server
        .mock("GET", "/api/datasources/42")
        .match_header("authorization", "Bearer glsa_test")
        .with_body(remote_body(42, "https://cloud.mongodb.com"))
        .create_async()
        .await;

    let client = tokio_test::assert_ok!(Client::new("glsa_test", &server.url()));
    let resource = DataSourceGenericResource::new(Arc::new(client));

    let imported = resource
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: TYPE_NAME.to_string(),
                id: "42".to_string(),
            },
        )
        .await;
    assert!(imported.diagnostics.is_empty());

    let seeded = imported.imported_resources[0].state.clone();
    let response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: TYPE_NAME.to_string(),
                current_state: seeded,
            },
        )
        .await;

    let state = response.new_state.unwrap();
    assert_eq!(
        state.get_string(&AttributePath::new("url")).unwrap(),
        "https://cloud.mongodb.com"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("access_mode")).unwrap(),
        "proxy"
    );
}
