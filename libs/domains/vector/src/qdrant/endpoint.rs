/// Qdrant's HTTP/REST port.
pub const QDRANT_REST_PORT: u16 = 6333;
/// Qdrant's gRPC port.
pub const QDRANT_GRPC_PORT: u16 = 6334;
/// gRPC port published by the local docker-compose stack.
pub const DOCKER_GRPC_PORT: u16 = 8086;
/// REST port paired with [`DOCKER_GRPC_PORT`].
pub const DOCKER_REST_PORT: u16 = 8087;

/// Derives the REST base URLs to try for a configured Qdrant host/port.
///
/// Deployments often configure the gRPC port, so plaintext connections try
/// the standard REST port first, then the REST port mapped from the
/// configured one, then the configured port itself. TLS deployments sit
/// behind a gateway and get exactly one URL on the default HTTPS port.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionEndpointResolver;

impl ConnectionEndpointResolver {
    /// REST port paired with a configured port; unknown ports map to themselves.
    pub fn rest_port_for(configured_port: u16) -> u16 {
        match configured_port {
            QDRANT_GRPC_PORT => QDRANT_REST_PORT,
            DOCKER_GRPC_PORT => DOCKER_REST_PORT,
            other => other,
        }
    }

    /// Ordered, duplicate-free candidate list. Never empty.
    pub fn candidate_base_urls(host: &str, configured_port: u16, use_tls: bool) -> Vec<String> {
        let host = host.trim();

        if use_tls {
            return vec![format!("https://{}", host)];
        }

        let mut candidates = Vec::with_capacity(3);
        for port in [
            QDRANT_REST_PORT,
            Self::rest_port_for(configured_port),
            configured_port,
        ] {
            let url = format!("http://{}:{}", host, port);
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
        candidates
    }
}
