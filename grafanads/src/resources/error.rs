use crate::api::ApiError;
use thiserror::Error;

/// Failures of a data source operation
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Stored identity is not a decimal integer; state is corrupt, retrying won't help
    #[error("Invalid id: {0:?}")]
    InvalidIdentity(String),

    /// Grafana no longer knows the id
    #[error("data source not found")]
    NotFound,

    #[error(transparent)]
    Remote(ApiError),

    #[error("Failed to build state: {0}")]
    State(#[from] tfplug::TfplugError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identity_names_raw_value() {
        let err = DataSourceError::InvalidIdentity("12a".to_string());
        assert_eq!(err.to_string(), r#"Invalid id: "12a""#);
    }

    #[test]
    fn remote_errors_display_verbatim() {
        let api = ApiError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
            message: "Failed to add datasource".to_string(),
        };
        let expected = api.to_string();
        assert_eq!(DataSourceError::Remote(api).to_string(), expected);
    }
}
