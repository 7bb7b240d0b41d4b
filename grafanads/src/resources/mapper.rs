//! Translation between Terraform state and [`DataSourceGeneric`]
//!
//! The direction state -> API covers every attribute, including the six
//! typed map groups that collapse into `jsonData` and `secureJsonData`.
//! The direction API -> state only refreshes scalars; the map groups stay
//! as configured since Grafana never returns secure values.

use std::collections::HashMap;

use tfplug::types::{AttributePath, Dynamic, DynamicValue};

use super::DataSourceError;
use crate::api::{DataSourceGeneric, JsonData, JsonValue};

/// Terraform attribute names
pub mod attr {
    pub const ID: &str = "id";
    pub const ACCESS_MODE: &str = "access_mode";
    pub const ORG_ID: &str = "org_id";
    pub const BASIC_AUTH_ENABLED: &str = "basic_auth_enabled";
    pub const BASIC_AUTH_USERNAME: &str = "basic_auth_username";
    pub const BASIC_AUTH_PASSWORD: &str = "basic_auth_password";
    pub const DATABASE_NAME: &str = "database_name";
    pub const IS_DEFAULT: &str = "is_default";
    pub const NAME: &str = "name";
    pub const PASSWORD: &str = "password";
    pub const TYPE: &str = "type";
    pub const URL: &str = "url";
    pub const USERNAME: &str = "username";
}

pub const DEFAULT_ACCESS_MODE: &str = "proxy";

/// Names of the three typed map attributes feeding one merged mapping
#[derive(Debug, Clone, Copy)]
pub struct JsonDataGroups {
    pub string: &'static str,
    pub bool: &'static str,
    pub int: &'static str,
}

pub const JSON_DATA: JsonDataGroups = JsonDataGroups {
    string: "json_data_string",
    bool: "json_data_bool",
    int: "json_data_int",
};

pub const SECURE_JSON_DATA: JsonDataGroups = JsonDataGroups {
    string: "secure_json_string",
    bool: "secure_json_bool",
    int: "secure_json_int",
};

pub fn parse_identity(raw: &str) -> Result<i64, DataSourceError> {
    raw.parse::<i64>()
        .map_err(|_| DataSourceError::InvalidIdentity(raw.to_string()))
}

pub fn format_identity(id: i64) -> String {
    id.to_string()
}

/// The stored identity, or None when the resource has not been created.
/// An identity of any kind other than string is corrupt state.
pub fn identity(state: &DynamicValue) -> Result<Option<String>, DataSourceError> {
    match state.get(&AttributePath::new(attr::ID)) {
        Err(_) | Ok(Dynamic::Null) | Ok(Dynamic::Unknown) => Ok(None),
        Ok(Dynamic::String(id)) if id.is_empty() => Ok(None),
        Ok(Dynamic::String(id)) => Ok(Some(id.clone())),
        Ok(Dynamic::Number(n)) => Err(DataSourceError::InvalidIdentity(n.to_string())),
        Ok(Dynamic::Bool(b)) => Err(DataSourceError::InvalidIdentity(b.to_string())),
        Ok(other) => Err(DataSourceError::InvalidIdentity(other.type_name().to_string())),
    }
}

/// Identity of a resource that must already exist
pub fn existing_identity(state: &DynamicValue) -> Result<i64, DataSourceError> {
    parse_identity(&identity(state)?.unwrap_or_default())
}

/// Merge the three typed groups into one mapping.
/// Groups are applied string, bool, int; a later group overwrites a key
/// an earlier one already set.
pub fn merge_json_data<S, B, I>(strings: S, bools: B, ints: I) -> JsonData
where
    S: IntoIterator<Item = (String, String)>,
    B: IntoIterator<Item = (String, bool)>,
    I: IntoIterator<Item = (String, i64)>,
{
    let mut merged = JsonData::new();
    merged.extend(strings.into_iter().map(|(k, v)| (k, JsonValue::String(v))));
    merged.extend(bools.into_iter().map(|(k, v)| (k, JsonValue::Bool(v))));
    merged.extend(ints.into_iter().map(|(k, v)| (k, JsonValue::Int(v))));
    merged
}

/// Build the API representation from configuration or state
pub fn to_resource(state: &DynamicValue) -> Result<DataSourceGeneric, DataSourceError> {
    let id = match identity(state)? {
        Some(raw) => parse_identity(&raw)?,
        None => 0,
    };

    let access = match string_attr(state, attr::ACCESS_MODE) {
        access if access.is_empty() => DEFAULT_ACCESS_MODE.to_string(),
        access => access,
    };

    Ok(DataSourceGeneric {
        id,
        org_id: int_attr(state, attr::ORG_ID),
        name: string_attr(state, attr::NAME),
        ds_type: string_attr(state, attr::TYPE),
        url: string_attr(state, attr::URL),
        access,
        database: string_attr(state, attr::DATABASE_NAME),
        user: string_attr(state, attr::USERNAME),
        password: string_attr(state, attr::PASSWORD),
        is_default: bool_attr(state, attr::IS_DEFAULT),
        basic_auth: bool_attr(state, attr::BASIC_AUTH_ENABLED),
        basic_auth_user: string_attr(state, attr::BASIC_AUTH_USERNAME),
        basic_auth_password: string_attr(state, attr::BASIC_AUTH_PASSWORD),
        json_data: json_data(state, JSON_DATA),
        secure_json_data: json_data(state, SECURE_JSON_DATA),
    })
}

/// Write every remote scalar back into state
pub fn from_resource(
    data_source: &DataSourceGeneric,
    state: &mut DynamicValue,
) -> tfplug::Result<()> {
    let strings = [
        (attr::ID, format_identity(data_source.id)),
        (attr::ACCESS_MODE, data_source.access.clone()),
        (attr::BASIC_AUTH_USERNAME, data_source.basic_auth_user.clone()),
        (attr::BASIC_AUTH_PASSWORD, data_source.basic_auth_password.clone()),
        (attr::DATABASE_NAME, data_source.database.clone()),
        (attr::NAME, data_source.name.clone()),
        (attr::PASSWORD, data_source.password.clone()),
        (attr::TYPE, data_source.ds_type.clone()),
        (attr::URL, data_source.url.clone()),
        (attr::USERNAME, data_source.user.clone()),
    ];
    for (name, value) in strings {
        state.set_string(&AttributePath::new(name), value)?;
    }

    state.set_bool(
        &AttributePath::new(attr::BASIC_AUTH_ENABLED),
        data_source.basic_auth,
    )?;
    state.set_bool(&AttributePath::new(attr::IS_DEFAULT), data_source.is_default)?;
    state.set_number(&AttributePath::new(attr::ORG_ID), data_source.org_id as f64)?;

    Ok(())
}

fn string_attr(state: &DynamicValue, name: &str) -> String {
    state
        .get_string(&AttributePath::new(name))
        .unwrap_or_default()
}

fn bool_attr(state: &DynamicValue, name: &str) -> bool {
    state.get_bool(&AttributePath::new(name)).unwrap_or(false)
}

fn int_attr(state: &DynamicValue, name: &str) -> i64 {
    state
        .get_number(&AttributePath::new(name))
        .map(|n| n as i64)
        .unwrap_or(0)
}

fn map_attr(state: &DynamicValue, name: &str) -> HashMap<String, Dynamic> {
    state
        .get_map(&AttributePath::new(name))
        .unwrap_or_default()
}

fn json_data(state: &DynamicValue, groups: JsonDataGroups) -> JsonData {
    let strings = map_attr(state, groups.string)
        .into_iter()
        .filter_map(|(k, v)| match v {
            Dynamic::String(s) => Some((k, s)),
            _ => None,
        });
    let bools = map_attr(state, groups.bool)
        .into_iter()
        .filter_map(|(k, v)| v.as_bool().map(|b| (k, b)));
    let ints = map_attr(state, groups.int)
        .into_iter()
        .filter_map(|(k, v)| v.as_number().map(|n| (k, n as i64)));

    merge_json_data(strings, bools, ints)
}
