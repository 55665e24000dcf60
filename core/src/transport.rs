//! The I/O seam between the client and the network.
//!
//! # Design
//! `StackServiceClient` never performs I/O itself. Anything that can turn an
//! `HttpRequest` into an `HttpResponse` can drive it: a request signer in
//! front of a real HTTP stack, a recording stub in tests, or the plain
//! `UreqTransport` below for local emulators and signing proxies.

use tracing::debug_span;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request and returns the response as data.
///
/// Non-2xx statuses must come back as `Ok(HttpResponse)`; `Err` is reserved
/// for failures where no response exists (connection refused, TLS, etc.).
pub trait Transport {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Unsigned transport on top of a blocking `ureq` agent.
///
/// `GET` requests carry their parameters in the query string, `POST` requests
/// as an urlencoded form body. Bodies that are not valid UTF-8 are decoded
/// lossily so a non-200 answer still reaches the caller as a response.
///
/// The reason phrase is the canonical one for the status code, empty for
/// codes that have none. The server's own phrase is not available through
/// `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let proxy = config
            .proxy
            .as_ref()
            .map(|p| ureq::Proxy::new(&p.url()))
            .transpose()
            .map_err(|e| ApiError::encoding("proxy", e.to_string()))?;
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .proxy(proxy)
            .build()
            .new_agent();
        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let span = debug_span!("cfn_request", action = %request.action, method = %request.method);
        let _guard = span.enter();

        let pairs = request.params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        let result = match request.method {
            HttpMethod::Get => self.agent.get(&request.url).query_pairs(pairs).call(),
            HttpMethod::Post => self.agent.post(&request.url).send_form(pairs),
        };
        let mut response = result.map_err(|e| ApiError::TransportError(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::TransportError(e.to_string()))?;
        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "response received");
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
