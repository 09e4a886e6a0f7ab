//! Snapshot tests for the Cohere client

#[cfg(test)]
mod snapshot_tests {
    use crate::{CohereClient, CohereConfig, LlmProvider};

    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = CohereConfig {
            api_key: "test_api_key_redacted".to_string(),
            api_url: "https://api.cohere.com".to_string(),
        };

        assert_yaml_snapshot!(config, @r###"
        ---
        api_key: test_api_key_redacted
        api_url: "https://api.cohere.com"
        "###);
    }

    #[test]
    fn test_embedding_model_override() {
        let config = CohereConfig::new("test_key");
        let client = CohereClient::new(config)
            .unwrap()
            .with_embedding_model("embed-english-light-v3.0", 384);

        assert_eq!(client.embedding_dimension(), 384);
        assert_eq!(client.provider_name(), "cohere");
    }
}
