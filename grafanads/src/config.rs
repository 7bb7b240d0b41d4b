//! Provider configuration block

use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::ClientConfig;

pub const URL_ENV_VAR: &str = "GRAFANA_URL";
pub const AUTH_ENV_VAR: &str = "GRAFANA_AUTH";

pub const URL: &str = "url";
pub const AUTH: &str = "auth";
pub const TIMEOUT: &str = "timeout";

/// Connection settings resolved from the provider block and its env defaults
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub url: String,
    /// Either `user:password` or an API key
    pub auth: String,
    pub client: ClientConfig,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Expects schema defaults to have been applied already
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let url = required_string(config, URL);
        let auth = required_string(config, AUTH);
        let client = client_config(config);

        match (url, auth, client) {
            (Some(url), Some(auth), Ok(client)) => Ok(Self { url, auth, client }),
            (url, auth, client) => {
                let mut diagnostics = vec![];
                if url.is_none() {
                    diagnostics.push(missing(URL, URL_ENV_VAR));
                }
                if auth.is_none() {
                    diagnostics.push(missing(AUTH, AUTH_ENV_VAR));
                }
                if let Err(diagnostic) = client {
                    diagnostics.push(diagnostic);
                }
                Err(diagnostics)
            }
        }
    }
}

/// `timeout` is optional; unset keeps the client default
fn client_config(config: &DynamicValue) -> Result<ClientConfig, Diagnostic> {
    let path = AttributePath::new(TIMEOUT);
    match config.get(&path) {
        Err(_) | Ok(Dynamic::Null) => Ok(ClientConfig::default()),
        Ok(Dynamic::Number(n)) if *n >= 1.0 && n.fract() == 0.0 => Ok(ClientConfig {
            timeout_seconds: *n as u64,
        }),
        Ok(other) => Err(Diagnostic::error(
            "timeout must be a positive whole number of seconds",
            format!("got {:?}", other),
        )
        .with_attribute(path)),
    }
}

fn required_string(config: &DynamicValue, name: &str) -> Option<String> {
    config
        .get_string(&AttributePath::new(name))
        .ok()
        .filter(|s| !s.is_empty())
}

fn missing(name: &str, env_var: &str) -> Diagnostic {
    Diagnostic::error(
        format!(
            "{} is required (set in provider config or {} env var)",
            name, env_var
        ),
        "",
    )
    .with_attribute(AttributePath::new(name))
}
