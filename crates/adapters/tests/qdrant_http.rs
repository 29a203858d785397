// Qdrant REST adapter integration tests (feature-gated).
#![allow(missing_docs, reason = "integration test crate")]

#[cfg(feature = "qdrant-rest")]
mod qdrant {
    use knowledge_search_adapters::vector_store::{QdrantRestConfig, QdrantRestVectorStore};
    use knowledge_search_domain::{
        CollectionSpec, DistanceMetric, IndexParams, MetadataFilter, TopologyRegistry,
    };
    use knowledge_search_ports::{VectorSearchQuery, VectorStorePort};
    use knowledge_search_shared::{ErrorClass, ErrorCode, RequestContext, Result};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> Result<QdrantRestVectorStore> {
        QdrantRestVectorStore::new(&QdrantRestConfig {
            url: server.uri().into(),
            api_key: Some("example".into()), // pragma: allowlist secret
            timeout_ms: 5_000,
        })
    }

    #[tokio::test]
    async fn exists_reads_result_flag() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/global-principles/exists"))
            .and(header("api-key", "example"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "exists": true },
                "status": "ok",
                "time": 0.0001
            })))
            .mount(&server)
            .await;

        let topology = TopologyRegistry::default();
        let ctx = RequestContext::new_request();
        let exists = store(&server)?
            .collection_exists(&ctx, topology.global_principles().clone())
            .await?;
        assert!(exists);
        Ok(())
    }

    #[tokio::test]
    async fn create_sends_vector_and_index_config() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/unified-index"))
            .and(body_json(json!({
                "vectors": { "size": 768, "distance": "Cosine" },
                "hnsw_config": { "m": 16, "ef_construct": 100, "full_scan_threshold": 10000 },
                "optimizers_config": { "default_segment_number": 2, "max_segment_size": 1000000 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": true,
                "status": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let topology = TopologyRegistry::default();
        let spec = CollectionSpec {
            dimension: 768,
            distance: DistanceMetric::Cosine,
            index: IndexParams {
                m: 16,
                ef_construct: 100,
                full_scan_threshold: 10_000,
            },
        };
        let ctx = RequestContext::new_request();
        store(&server)?
            .create_collection(&ctx, topology.unified_index().clone(), spec)
            .await
    }

    #[tokio::test]
    async fn search_maps_points_to_hits() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/global-principles/points/search"))
            .and(body_json(json!({
                "vector": [0.5, 0.25],
                "limit": 10,
                "score_threshold": 0.5,
                "filter": { "must": [ { "key": "framework", "match": { "value": "gin" } } ] },
                "with_payload": { "exclude": ["content"] },
                "with_vector": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    { "id": 7, "version": 1, "score": 0.93, "payload": { "framework": "gin", "content_type": "principle" } },
                    { "id": "2b1f6c1e-1111-4c3b-9f0e-3f6a5b7c8d9e", "version": 1, "score": 0.71, "payload": null }
                ],
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let topology = TopologyRegistry::default();
        let collection = topology.global_principles().clone();
        let ctx = RequestContext::new_request();
        let hits = store(&server)?
            .search(
                &ctx,
                VectorSearchQuery {
                    collection: collection.clone(),
                    vector: Arc::from(vec![0.5_f32, 0.25]),
                    limit: 10,
                    score_threshold: Some(0.5),
                    filter: MetadataFilter::from_constraints(Some("gin"), &[]),
                    with_content: false,
                },
            )
            .await?;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_ref(), "7");
        assert_eq!(hits[0].collection, collection);
        assert_eq!(hits[0].facet("framework").as_ref(), "gin");
        assert_eq!(hits[1].id.as_ref(), "2b1f6c1e-1111-4c3b-9f0e-3f6a5b7c8d9e");
        assert!(hits[1].metadata.is_empty());
        assert!(hits.iter().all(|hit| hit.content.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn collection_info_and_listing() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "collections": [ { "name": "global-principles" }, { "name": "demo-frameworks" } ] },
                "status": "ok"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/demo-frameworks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "status": "green",
                    "points_count": 42,
                    "segments_count": 2,
                    "disk_data_size": 8192,
                    "ram_data_size": 1024,
                    "config": { "params": { "vectors": { "size": 768, "distance": "Cosine" } } }
                },
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let adapter = store(&server)?;
        let ctx = RequestContext::new_request();
        let names = adapter.list_collections(&ctx).await?;
        assert_eq!(names, vec![Box::from("global-principles"), Box::from("demo-frameworks")]);

        let info = adapter.collection_info(&ctx, "demo-frameworks".into()).await?;
        assert_eq!(info.points_count, 42);
        assert_eq!(info.vector_size, Some(768));
        assert_eq!(info.status.as_ref(), "green");
        assert_eq!(info.disk_data_size, 8192);
        assert_eq!(info.ram_data_size, 1024);
        Ok(())
    }

    #[tokio::test]
    async fn missing_collection_is_not_found() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": { "error": "Not found: Collection `gone` doesn't exist!" },
                "time": 0.0
            })))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        let error = store(&server)?.collection_info(&ctx, "gone".into()).await.err();

        assert_eq!(error.as_ref().map(|error| error.code.clone()), Some(ErrorCode::not_found()));
        assert_eq!(
            error.as_ref().map(|error| error.message.as_str()),
            Some("Not found: Collection `gone` doesn't exist!")
        );
        Ok(())
    }

    #[tokio::test]
    async fn health_check_fails_on_server_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ctx = RequestContext::new_request();
        let error = store(&server)?.health_check(&ctx).await.err();

        assert_eq!(
            error.as_ref().map(|error| error.code.clone()),
            Some(ErrorCode::new("vector", "vdb_connection"))
        );
        assert_eq!(error.map(|error| error.class), Some(ErrorClass::Retriable));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_store_is_a_connection_error() -> Result<()> {
        let adapter = QdrantRestVectorStore::new(&QdrantRestConfig {
            url: "http://127.0.0.1:9".into(),
            api_key: None,
            timeout_ms: 2_000,
        })?;
        let ctx = RequestContext::new_request();
        let error = adapter.health_check(&ctx).await.err();

        assert_eq!(error.map(|error| error.class), Some(ErrorClass::Retriable));
        Ok(())
    }
}
