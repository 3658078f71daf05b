//! Qdrant test infrastructure
//!
//! Provides a `TestQdrant` helper that starts a Qdrant container for testing.

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const QDRANT_IMAGE: &str = "qdrant/qdrant";
const QDRANT_TAG: &str = "v1.13.4";
const REST_PORT: u16 = 6333;
const GRPC_PORT: u16 = 6334;

/// Test Qdrant wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::TestQdrant;
///
/// # async fn example() {
/// let qdrant = TestQdrant::new().await;
/// let ready = reqwest::get(format!("{}/readyz", qdrant.rest_url)).await.unwrap();
/// assert!(ready.status().is_success());
/// # }
/// ```
pub struct TestQdrant {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    pub host: String,
    /// Host port mapped to the container's REST port
    pub rest_port: u16,
    /// Host port mapped to the container's gRPC port
    pub grpc_port: u16,
    pub rest_url: String,
}

impl TestQdrant {
    /// Start a Qdrant container with both REST and gRPC ports published.
    pub async fn new() -> Self {
        Self::start(None).await
    }

    /// Start a Qdrant container that requires `api_key` on every request.
    pub async fn with_api_key(api_key: &str) -> Self {
        Self::start(Some(api_key)).await
    }

    async fn start(api_key: Option<&str>) -> Self {
        let image = GenericImage::new(QDRANT_IMAGE, QDRANT_TAG)
            .with_exposed_port(REST_PORT.tcp())
            .with_exposed_port(GRPC_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("listening on 6333"));

        let request = match api_key {
            Some(key) => image.with_env_var("QDRANT__SERVICE__API_KEY", key),
            None => image.into(),
        };

        let container = request
            .start()
            .await
            .expect("Failed to start Qdrant container");

        let host = container
            .get_host()
            .await
            .expect("Failed to get Qdrant host")
            .to_string();

        let rest_port = container
            .get_host_port_ipv4(REST_PORT)
            .await
            .expect("Failed to get Qdrant REST port");

        let grpc_port = container
            .get_host_port_ipv4(GRPC_PORT)
            .await
            .expect("Failed to get Qdrant gRPC port");

        let rest_url = format!("http://{}:{}", host, rest_port);

        tracing::info!(rest_port, grpc_port, "Test Qdrant ready ({}:{})", QDRANT_IMAGE, QDRANT_TAG);

        Self {
            container,
            host,
            rest_port,
            grpc_port,
            rest_url,
        }
    }
}

impl Drop for TestQdrant {
    fn drop(&mut self) {
        tracing::debug!(rest_port = self.rest_port, "Cleaning up test Qdrant container");
    }
}
