// HTTP embedding adapter integration tests (feature-gated).
#![allow(missing_docs, reason = "integration test crate")]

#[cfg(feature = "openai")]
mod openai {
    use knowledge_search_adapters::embedding::openai::{HttpEmbedding, HttpEmbeddingConfig};
    use knowledge_search_ports::{EmbedBatchRequest, EmbeddingPort};
    use knowledge_search_shared::{ErrorClass, ErrorCode, RequestContext, Result};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, api_key: Option<&str>) -> HttpEmbeddingConfig {
        HttpEmbeddingConfig {
            base_url: format!("{}/v1/", server.uri()).into(),
            model: "all-mpnet-base-v2".into(),
            api_key: api_key.map(Box::from),
            dimension: 2,
            timeout_ms: 5_000,
        }
    }

    #[tokio::test]
    async fn embed_posts_model_and_input() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer example"))
            .and(body_json(json!({
                "model": "all-mpnet-base-v2",
                "input": "error handling in go"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "embedding": [0.1, 0.2], "index": 0 } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = HttpEmbedding::new(&config(&server, Some("example")))?; // pragma: allowlist secret
        let ctx = RequestContext::new_request();
        let embedding = adapter.embed(&ctx, "error handling in go".into()).await?;

        assert_eq!(embedding.as_slice(), &[0.1, 0.2]);
        assert_eq!(adapter.model_info().dimension, 2);
        Ok(())
    }

    #[tokio::test]
    async fn batch_preserves_input_order() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_json(json!({
                "model": "all-mpnet-base-v2",
                "input": ["a", "b"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "embedding": [0.3, 0.4], "index": 1 },
                    { "embedding": [0.1, 0.2], "index": 0 }
                ]
            })))
            .mount(&server)
            .await;

        let adapter = HttpEmbedding::new(&config(&server, None))?;
        let ctx = RequestContext::new_request();
        let vectors = adapter
            .embed_batch(&ctx, EmbedBatchRequest::from(vec!["a".to_owned(), "b".to_owned()]))
            .await?;

        let slices: Vec<&[f32]> = vectors.iter().map(|vector| vector.as_slice()).collect();
        assert_eq!(slices, vec![&[0.1_f32, 0.2][..], &[0.3_f32, 0.4][..]]);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "embedding": [0.1, 0.2, 0.3], "index": 0 } ]
            })))
            .mount(&server)
            .await;

        let adapter = HttpEmbedding::new(&config(&server, None))?;
        let ctx = RequestContext::new_request();
        let result = adapter.embed(&ctx, "hello".into()).await;

        let error = result.err();
        assert_eq!(
            error.as_ref().map(|error| error.code.clone()),
            Some(ErrorCode::embedding_failed())
        );
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_retriable() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "message": "model is loading", "type": "server_error" }
            })))
            .mount(&server)
            .await;

        let adapter = HttpEmbedding::new(&config(&server, None))?;
        let ctx = RequestContext::new_request();
        let error = adapter.embed(&ctx, "hello".into()).await.err();

        assert_eq!(error.as_ref().map(|error| error.class), Some(ErrorClass::Retriable));
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("status"))
                .map(String::as_str),
            Some("503")
        );
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_context_skips_the_request() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = HttpEmbedding::new(&config(&server, None))?;
        let ctx = RequestContext::new_request();
        ctx.cancel();
        let error = adapter.embed(&ctx, "hello".into()).await.err();

        assert!(error.is_some_and(|error| error.is_cancelled()));
        Ok(())
    }
}
