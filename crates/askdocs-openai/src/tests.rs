//! Snapshot tests for the OpenAI client

#[cfg(test)]
mod snapshot_tests {
    use crate::{LlmProvider, OpenAiClient, OpenAiConfig};

    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = OpenAiConfig {
            api_key: "test_api_key_redacted".to_string(),
            api_url: "https://api.openai.com/v1".to_string(),
        };

        assert_yaml_snapshot!(config, @r###"
        ---
        api_key: test_api_key_redacted
        api_url: "https://api.openai.com/v1"
        "###);
    }

    #[test]
    fn test_model_constants() {
        assert_yaml_snapshot!(OpenAiClient::TEXT_EMBEDDING_3_SMALL, @r###"
        ---
        text-embedding-3-small
        "###);
        assert_yaml_snapshot!(OpenAiClient::GPT_4O_MINI, @r###"
        ---
        gpt-4o-mini
        "###);
    }

    #[test]
    fn test_embedding_model_override() {
        let config = OpenAiConfig::new("test_key");
        let client = OpenAiClient::new(config)
            .unwrap()
            .with_embedding_model("text-embedding-3-large", 3072);

        assert_eq!(client.embedding_dimension(), 3072);
        assert_eq!(client.provider_name(), "openai");
    }
}
