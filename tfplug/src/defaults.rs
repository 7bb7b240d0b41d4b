//! Default value providers for attributes
//!
//! Defaults are evaluated when an attribute is absent or null in
//! configuration.
//!
//! ```no_run
//! use tfplug::defaults::{EnvDefault, StaticDefault};
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//!
//! let access = AttributeBuilder::new("access_mode", AttributeType::String)
//!     .optional()
//!     .default(StaticDefault::string("proxy"))
//!     .build();
//!
//! let url = AttributeBuilder::new("url", AttributeType::String)
//!     .required()
//!     .default(EnvDefault::create_required("GRAFANA_URL"))
//!     .build();
//! ```

use crate::schema::DefaultValue;
use crate::types::{AttributePath, Dynamic};
use std::env;
use std::sync::Arc;

/// StaticDefault provides a fixed default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Arc<dyn DefaultValue> {
        Arc::new(Self { value })
    }

    pub fn string(value: &str) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Arc<dyn DefaultValue> {
        Self::create(Dynamic::Bool(value))
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _path: &AttributePath) -> Dynamic {
        self.value.clone()
    }
}

/// EnvDefault reads the default from an environment variable
pub struct EnvDefault {
    env_var: String,
    fallback: Option<String>,
}

impl EnvDefault {
    pub fn create(env_var: &str, fallback: &str) -> Arc<dyn DefaultValue> {
        Arc::new(Self {
            env_var: env_var.to_string(),
            fallback: Some(fallback.to_string()),
        })
    }

    /// No fallback: the attribute stays null when the variable is unset
    pub fn create_required(env_var: &str) -> Arc<dyn DefaultValue> {
        Arc::new(Self {
            env_var: env_var.to_string(),
            fallback: None,
        })
    }
}

impl DefaultValue for EnvDefault {
    fn description(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!(
                "default from environment variable {} (fallback: {})",
                self.env_var, fallback
            ),
            None => format!("default from environment variable {}", self.env_var),
        }
    }

    fn default_value(&self, _path: &AttributePath) -> Dynamic {
        match env::var(&self.env_var) {
            Ok(val) if !val.is_empty() => Dynamic::String(val),
            _ => self
                .fallback
                .clone()
                .map(Dynamic::String)
                .unwrap_or(Dynamic::Null),
        }
    }
}
