//! Data source API implementation
//!
//! Covers `/api/datasources/{id}` for the fields every Grafana data source
//! plugin shares. Plugin-specific settings travel in `jsonData` and the
//! write-only `secureJsonData`.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::{ApiError, Client};

/// A single `jsonData`/`secureJsonData` value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonValue {
    String(String),
    Bool(bool),
    Int(i64),
}

impl JsonValue {
    /// Only strings, booleans and integers map onto the three typed groups
    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(JsonValue::String(s)),
            serde_json::Value::Bool(b) => Some(JsonValue::Bool(b)),
            serde_json::Value::Number(n) => n.as_i64().map(JsonValue::Int),
            _ => None,
        }
    }
}

pub type JsonData = BTreeMap<String, JsonValue>;

/// Grafana data source as sent to and returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSourceGeneric {
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub ds_type: String,
    pub url: String,
    pub access: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub is_default: bool,
    pub basic_auth: bool,
    pub basic_auth_user: String,
    pub basic_auth_password: String,
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_json_data"
    )]
    pub json_data: JsonData,
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_json_data"
    )]
    pub secure_json_data: JsonData,
}

/// Real data sources carry nested objects and floats in `jsonData`; those
/// have no typed group to land in and are dropped instead of failing the read.
fn deserialize_json_data<'de, D>(deserializer: D) -> Result<JsonData, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| JsonValue::from_json(value).map(|v| (key, v)))
        .collect())
}

impl DataSourceGeneric {
    pub const API_PATH: &'static str = "/api/datasources";

    pub fn resource_path(id: i64) -> String {
        format!("{}/{}", Self::API_PATH, id)
    }
}

/// Response from POST /api/datasources
#[derive(Debug, Deserialize)]
struct CreateDataSourceResponse {
    id: i64,
}

/// The remote operations the data source resource depends on
#[async_trait]
pub trait DataSourceApi: Send + Sync {
    async fn data_source(&self, id: i64) -> Result<DataSourceGeneric, ApiError>;

    /// Returns the id Grafana assigned
    async fn new_data_source(&self, data_source: &DataSourceGeneric) -> Result<i64, ApiError>;

    async fn update_data_source(&self, data_source: &DataSourceGeneric) -> Result<(), ApiError>;

    async fn delete_data_source(&self, id: i64) -> Result<(), ApiError>;
}

#[async_trait]
impl DataSourceApi for Client {
    /// GET /api/datasources/{id}
    async fn data_source(&self, id: i64) -> Result<DataSourceGeneric, ApiError> {
        self.get(&DataSourceGeneric::resource_path(id)).await
    }

    /// POST /api/datasources
    async fn new_data_source(&self, data_source: &DataSourceGeneric) -> Result<i64, ApiError> {
        let response: CreateDataSourceResponse =
            self.post(DataSourceGeneric::API_PATH, data_source).await?;
        Ok(response.id)
    }

    /// PUT /api/datasources/{id}
    async fn update_data_source(&self, data_source: &DataSourceGeneric) -> Result<(), ApiError> {
        self.put(&DataSourceGeneric::resource_path(data_source.id), data_source)
            .await
    }

    /// DELETE /api/datasources/{id}
    async fn delete_data_source(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&DataSourceGeneric::resource_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn prometheus() -> DataSourceGeneric {
        DataSourceGeneric {
            org_id: 1,
            name: "prometheus".to_string(),
            ds_type: "prometheus".to_string(),
            url: "http://prometheus:9090".to_string(),
            access: "proxy".to_string(),
            json_data: JsonData::from([
                ("httpMethod".to_string(), JsonValue::String("POST".to_string())),
                ("timeInterval".to_string(), JsonValue::String("15s".to_string())),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn serializes_with_grafana_field_names() {
        let mut ds = prometheus();
        ds.basic_auth = true;
        ds.basic_auth_user = "scraper".to_string();
        ds.json_data
            .insert("tlsSkipVerify".to_string(), JsonValue::Bool(true));
        ds.json_data.insert("maxLines".to_string(), JsonValue::Int(1000));

        let value = serde_json::to_value(&ds).unwrap();
        assert_eq!(value["type"], "prometheus");
        assert_eq!(value["orgId"], 1);
        assert_eq!(value["basicAuth"], true);
        assert_eq!(value["basicAuthUser"], "scraper");
        assert_eq!(value["jsonData"]["tlsSkipVerify"], true);
        assert_eq!(value["jsonData"]["maxLines"], 1000);
        assert_eq!(value["jsonData"]["httpMethod"], "POST");
        assert!(value.get("secureJsonData").is_none());
    }

    #[test]
    fn deserializes_read_response_leniently() {
        let body = json!({
            "id": 12,
            "uid": "P1809F7CD0C75ACF3",
            "orgId": 1,
            "name": "loki",
            "type": "loki",
            "access": "proxy",
            "url": "http://loki:3100",
            "isDefault": false,
            "readOnly": false,
            "jsonData": {
                "maxLines": 1000,
                "derivedFields": [{"name": "traceID"}],
                "timeout": 30.5,
                "manageAlerts": true
            },
            "secureJsonFields": {"basicAuthPassword": true}
        });

        let ds: DataSourceGeneric = serde_json::from_value(body).unwrap();
        assert_eq!(ds.id, 12);
        assert_eq!(ds.ds_type, "loki");
        assert_eq!(ds.database, "");
        assert_eq!(ds.json_data.len(), 2);
        assert_eq!(ds.json_data["maxLines"], JsonValue::Int(1000));
        assert_eq!(ds.json_data["manageAlerts"], JsonValue::Bool(true));
        assert!(ds.secure_json_data.is_empty());
    }

    #[test]
    fn null_json_data_is_empty() {
        let ds: DataSourceGeneric =
            serde_json::from_value(json!({"id": 1, "name": "x", "type": "y", "jsonData": null}))
                .unwrap();
        assert!(ds.json_data.is_empty());
    }

    #[tokio::test]
    async fn new_data_source_returns_assigned_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/datasources")
            .match_body(Matcher::PartialJson(json!({
                "name": "prometheus",
                "type": "prometheus",
                "access": "proxy",
                "jsonData": {"httpMethod": "POST"}
            })))
            .with_body(r#"{"id":7,"message":"Datasource added","name":"prometheus"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let id = client.new_data_source(&prometheus()).await.unwrap();

        assert_eq!(id, 7);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_data_source_puts_to_id_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/datasources/7")
            .match_body(Matcher::PartialJson(json!({"id": 7, "url": "http://prometheus:9091"})))
            .with_body(r#"{"message":"Datasource updated"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let mut ds = prometheus();
        ds.id = 7;
        ds.url = "http://prometheus:9091".to_string();

        client.update_data_source(&ds).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn data_source_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/datasources/404")
            .with_status(404)
            .with_body(r#"{"message":"Data source not found"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.data_source(404).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[tokio::test]
    async fn delete_data_source_hits_id_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/datasources/5")
            .with_body(r#"{"message":"Data source deleted"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client.delete_data_source(5).await.unwrap();

        mock.assert_async().await;
    }
}
