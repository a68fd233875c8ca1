// Transport seam: the session client builds fully-formed requests (URL,
// headers incl. cookies, body) and hands them to a `Transport` which only
// moves bytes over the wire. Production code uses `HttpTransport`; tests
// plug in fakes that record what they were asked to send.

use crate::error::{PortalError, Result};
use log::trace;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};

/// A request ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Status, headers and the fully-read body of a response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// A 200 response with no headers.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        TransportResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

pub trait Transport {
    /// Execute exactly one request. Implementations must not follow
    /// redirects or manage cookies; the session client does both.
    fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse>;
}

/// Blocking reqwest transport. Redirects are disabled so that every hop
/// comes back through the session client and its cookie jar.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PortalError::RequestBuild(format!("building HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let res = builder.send().map_err(|e| PortalError::Transport {
            url: request.url.to_string(),
            message: e.to_string(),
        })?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().map_err(|e| PortalError::Read {
            url: request.url.to_string(),
            message: e.to_string(),
        })?;
        trace!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(TransportResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
