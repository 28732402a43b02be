//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, environment overrides
//! and validation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::config::*;
    use crate::errors::ExplorerError;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ====== Default Value Tests ======

    #[test]
    fn test_defaults_match_service_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.ingest.max_upload_size, 10_485_760);
        assert_eq!(config.embeddings.dimension, 768);
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.min_relevance_score - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.vector_store.provider, VectorStoreProvider::Pinecone);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_keywords_skip_overly_broad_triggers() {
        let keywords = default_document_keywords();
        assert!(keywords.contains(&"summarize".to_string()));
        assert!(keywords.contains(&"according to".to_string()));
        assert!(!keywords.contains(&"this".to_string()));
        assert!(!keywords.contains(&"in the".to_string()));
    }

    // ====== TOML Parsing Tests ======

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [ingest]
            chunk_size = 500
            chunk_overlap = 50

            [vector_store]
            provider = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.ingest.upload_dir, "./uploads");
        assert_eq!(config.vector_store.provider, VectorStoreProvider::Memory);
        assert_eq!(config.vector_store.index_name, "knowledge-explorer");
        assert_eq!(config.llm.llm_endpoint, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
            [vector_store]
            provider = "qdrant"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[retrieval]\nmin_relevance_score = 0.5\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert!((config.retrieval.min_relevance_score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ExplorerError::Io(_)));
    }

    // ====== Environment Override Tests ======

    #[test]
    fn test_env_overrides_apply() {
        let vars = env(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("GROQ_MODEL", "llama-3.3-70b-versatile"),
            ("PINECONE_API_KEY", "pc_test"),
            ("PINECONE_ENV", "eu-west-1"),
            ("PINECONE_INDEX", "docs"),
            ("JINA_API_KEY", "jina_test"),
            ("CHUNK_SIZE", "800"),
            ("CHUNK_OVERLAP", "100"),
            ("MIN_RELEVANCE_SCORE", "0.55"),
            ("PORT", "9000"),
            ("LOG_LEVEL", "DEBUG"),
        ]);

        let mut config = AppConfig::default();
        config
            .apply_env_overrides_from(|k| vars.get(k).cloned())
            .unwrap();

        assert_eq!(config.llm.llm_key, "gsk_test");
        assert_eq!(config.llm_model(), "llama-3.3-70b-versatile");
        assert_eq!(config.vector_store.api_key, "pc_test");
        assert_eq!(config.vector_store.region, "eu-west-1");
        assert_eq!(config.vector_store.index_name, "docs");
        assert_eq!(config.embeddings.api_key, "jina_test");
        assert_eq!(config.ingest.chunk_size, 800);
        assert_eq!(config.ingest.chunk_overlap, 100);
        assert!((config.retrieval.min_relevance_score - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert!(config.api_key_status().all_present());
    }

    #[test]
    fn test_env_override_with_bad_number_fails() {
        let vars = env(&[("CHUNK_SIZE", "lots")]);
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides_from(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ExplorerError::ConfigError(ref m) if m.contains("CHUNK_SIZE")));
    }

    #[test]
    fn test_api_key_status_reports_missing_keys() {
        let mut config = AppConfig::default();
        config.llm.llm_key = "gsk".to_string();
        config.embeddings.api_key = "   ".to_string();

        let status = config.api_key_status();
        assert!(status.groq);
        assert!(!status.pinecone);
        assert!(!status.jina);
        assert!(!status.all_present());
    }

    // ====== Validation Tests ======

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        assert!(matches!(
            config.validate(),
            Err(ExplorerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let mut config = AppConfig::default();
        config.ingest.chunk_size = 0;
        config.ingest.chunk_overlap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.min_relevance_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let mut config = AppConfig::default();
        config.llm.llm_endpoint = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm.llm_endpoint"));
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let mut config = AppConfig::default();
        config.embeddings.dimension = 0;
        assert!(config.validate().is_err());
    }
}
