use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::QdrantConfig;
use super::schema::{
    CollectionDescription, CollectionList, CreateCollectionRequest, CreatePayloadIndexRequest,
    PayloadIndexSpec, QdrantResponse,
};
use crate::error::{VectorError, VectorResult};

const MAX_ERROR_SNIPPET: usize = 512;

/// Administrative Qdrant calls the schema guardian needs.
///
/// Every call takes the REST base URL explicitly so the guardian can walk
/// candidate endpoints and pin the one that answered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QdrantAdmin: Send + Sync {
    /// `Ok(None)` when the collection does not exist.
    async fn get_collection(
        &self,
        base_url: &str,
        collection: &str,
    ) -> VectorResult<Option<CollectionDescription>>;

    async fn create_collection(
        &self,
        base_url: &str,
        collection: &str,
        request: &CreateCollectionRequest,
    ) -> VectorResult<()>;

    async fn create_payload_index(
        &self,
        base_url: &str,
        collection: &str,
        index: &PayloadIndexSpec,
    ) -> VectorResult<()>;

    async fn list_collections(&self, base_url: &str) -> VectorResult<Vec<String>>;

    /// `GET /readyz`
    async fn readiness(&self, base_url: &str) -> VectorResult<()>;
}

/// Qdrant REST client built on reqwest.
#[derive(Clone)]
pub struct QdrantRestClient {
    client: Client,
    api_key: Option<String>,
}

impl QdrantRestClient {
    pub fn new(config: &QdrantConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    fn collection_url(base_url: &str, collection: &str) -> String {
        format!(
            "{}/collections/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(collection)
        )
    }

    async fn into_error(endpoint: String, response: Response) -> VectorError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message: String = body
            .replace(['\r', '\n'], " ")
            .chars()
            .take(MAX_ERROR_SNIPPET)
            .collect();
        VectorError::http(endpoint, status, message)
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> VectorResult<T> {
        let body = response.text().await?;
        let envelope: QdrantResponse<T> = serde_json::from_str(&body).map_err(|e| {
            VectorError::Internal(format!("unexpected response from {}: {}", endpoint, e))
        })?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl QdrantAdmin for QdrantRestClient {
    async fn get_collection(
        &self,
        base_url: &str,
        collection: &str,
    ) -> VectorResult<Option<CollectionDescription>> {
        let url = Self::collection_url(base_url, collection);
        let endpoint = format!("GET /collections/{}", collection);
        let response = self.request(Method::GET, &url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Self::decode(&endpoint, response).await.map(Some),
            _ => Err(Self::into_error(endpoint, response).await),
        }
    }

    async fn create_collection(
        &self,
        base_url: &str,
        collection: &str,
        request: &CreateCollectionRequest,
    ) -> VectorResult<()> {
        let url = Self::collection_url(base_url, collection);
        let endpoint = format!("PUT /collections/{}", collection);
        let response = self.request(Method::PUT, &url).json(request).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Created concurrently by another instance; validation runs next.
            StatusCode::CONFLICT => {
                debug!(collection, "Collection already exists");
                Ok(())
            }
            _ => Err(Self::into_error(endpoint, response).await),
        }
    }

    async fn create_payload_index(
        &self,
        base_url: &str,
        collection: &str,
        index: &PayloadIndexSpec,
    ) -> VectorResult<()> {
        let url = format!("{}/index?wait=true", Self::collection_url(base_url, collection));
        let endpoint = format!("PUT /collections/{}/index", collection);
        let body = CreatePayloadIndexRequest::from(index);
        let response = self.request(Method::PUT, &url).json(&body).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::into_error(endpoint, response).await)
        }
    }

    async fn list_collections(&self, base_url: &str) -> VectorResult<Vec<String>> {
        let url = format!("{}/collections", base_url.trim_end_matches('/'));
        let endpoint = "GET /collections".to_string();
        let response = self.request(Method::GET, &url).send().await?;

        if !response.status().is_success() {
            return Err(Self::into_error(endpoint, response).await);
        }

        let list: CollectionList = Self::decode(&endpoint, response).await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    async fn readiness(&self, base_url: &str) -> VectorResult<()> {
        let url = format!("{}/readyz", base_url.trim_end_matches('/'));
        let response = self.request(Method::GET, &url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::into_error("GET /readyz".to_string(), response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdrant::schema::HybridSchemaTemplate;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(api_key: Option<&str>) -> QdrantRestClient {
        QdrantRestClient::new(&QdrantConfig {
            api_key: api_key.map(str::to_string),
            ..QdrantConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_collection_parses_description() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/java-docs"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "status": "green",
                    "config": { "params": {
                        "vectors": { "dense": { "size": 4096, "distance": "Cosine" } },
                        "sparse_vectors": { "bm25": {} }
                    } },
                    "payload_schema": { "url": { "data_type": "keyword" } }
                },
                "status": "ok",
                "time": 0.001
            })))
            .mount(&server)
            .await;

        let description = client(Some("secret"))
            .get_collection(&server.uri(), "java-docs")
            .await
            .unwrap()
            .unwrap();

        assert!(description.has_sparse_vector("bm25"));
        assert_eq!(description.payload_index_type("url"), Some("keyword"));
    }

    #[tokio::test]
    async fn test_get_missing_collection_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/java-pdfs"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": { "error": "Not found: Collection `java-pdfs` doesn't exist!" }
            })))
            .mount(&server)
            .await;

        let result = client(None).get_collection(&server.uri(), "java-pdfs").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_collection_sends_hybrid_schema() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/java-articles"))
            .and(body_json(json!({
                "vectors": { "dense": { "size": 8, "distance": "Cosine" } },
                "sparse_vectors": { "bm25": { "modifier": "idf" } },
                "on_disk_payload": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        let request = HybridSchemaTemplate::new("dense", "bm25", 8)
            .for_collection("java-articles")
            .create_request();

        client(None)
            .create_collection(&server.uri(), "java-articles", &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_existing_collection_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/java-articles"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": { "error": "Wrong input: Collection `java-articles` already exists!" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = HybridSchemaTemplate::new("dense", "bm25", 8)
            .for_collection("java-articles")
            .create_request();

        client(None)
            .create_collection(&server.uri(), "java-articles", &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_collection_rejection_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/java-articles"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let request = HybridSchemaTemplate::new("dense", "bm25", 8)
            .for_collection("java-articles")
            .create_request();

        let err = client(None)
            .create_collection(&server.uri(), "java-articles", &request)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_create_payload_index_waits_for_completion() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/java-docs/index"))
            .and(query_param("wait", "true"))
            .and(body_json(json!({
                "field_name": "docSet",
                "field_schema": { "type": "keyword" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
            .expect(1)
            .mount(&server)
            .await;

        client(None)
            .create_payload_index(&server.uri(), "java-docs", &PayloadIndexSpec::keyword("docSet"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_collections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "collections": [{ "name": "java-docs" }, { "name": "github-openjdk" }] }
            })))
            .mount(&server)
            .await;

        let names = client(None).list_collections(&server.uri()).await.unwrap();
        assert_eq!(names, vec!["java-docs", "github-openjdk"]);
    }

    #[tokio::test]
    async fn test_server_error_is_transient_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readyz"))
            .respond_with(ResponseTemplate::new(503).set_body_string("starting\nup"))
            .mount(&server)
            .await;

        let err = client(None).readiness(&server.uri()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // nothing listens on port 1
        let err = client(None)
            .get_collection("http://127.0.0.1:1", "java-docs")
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Transport(_)));
        assert!(err.is_transient());
    }
}
