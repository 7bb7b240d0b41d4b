//! Test helpers for the Grafana API

pub fn create_test_client(url: &str) -> super::Client {
    super::Client::new("test-api-key", url).unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_helper_client_uses_api_key() {
        let client = super::create_test_client("http://localhost:3000");
        assert_eq!(
            client.credentials(),
            &Credentials::ApiKey("test-api-key".to_string())
        );
    }
}
