// API client module: a small blocking client for the Compass portal. It owns
// the credentials, the target host and a cookie jar; the jar is the only
// mutable state and holds the session once `login` succeeds.

use crate::endpoints::{self, Endpoint, EventsQuery, RequestDescriptor};
use crate::error::{PortalError, Result};
use crate::transport::{HttpTransport, OutboundRequest, Transport, TransportResponse};
use log::{debug, info, warn};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, LOCATION, SET_COOKIE, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use std::fmt;

/// Sent as `User-Agent` on every request.
pub const USER_AGENT_VALUE: &str = "Go API/v1";

/// Name of the cookie that marks an established session.
pub const SESSION_COOKIE: &str = "ASP.NET_SessionId";

pub const MAX_REDIRECTS: u8 = 10;

/// Username/password pair. `Debug` never prints the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session client for one portal host. Each instance has its own jar;
/// nothing is shared between clients or persisted.
pub struct PortalClient<T: Transport = HttpTransport> {
    credentials: Credentials,
    host: String,
    base_url: Url,
    jar: Jar,
    transport: T,
}

impl PortalClient<HttpTransport> {
    /// Client talking to `https://{host}` over the network.
    pub fn new(credentials: Credentials, host: &str) -> Result<Self> {
        PortalClient::with_transport(credentials, host, HttpTransport::new()?)
    }
}

impl<T: Transport> PortalClient<T> {
    pub fn with_transport(credentials: Credentials, host: &str, transport: T) -> Result<Self> {
        let base_url = base_url(host)?;
        Ok(PortalClient {
            credentials,
            host: host.to_string(),
            base_url,
            jar: Jar::default(),
            transport,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` and return the raw body.
    pub fn raw_get(&self, path: &str) -> Result<Vec<u8>> {
        self.execute(Method::GET, path, &HeaderMap::new(), None)
    }

    /// POST `path` with extra `headers` and an optional `body`. The user
    /// agent always wins over a caller-supplied one.
    pub fn raw_post(
        &self,
        path: &str,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        self.execute(Method::POST, path, headers, body.map(|b| b.to_vec()))
    }

    /// Run a descriptor from the endpoint catalog.
    pub fn send(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>> {
        self.execute(
            descriptor.method.clone(),
            &descriptor.path,
            &descriptor.headers,
            descriptor.body.clone(),
        )
    }

    /// One authentication attempt. The response body is ignored; success
    /// is the presence of the session cookie afterwards. The portal's bot
    /// protection sometimes answers the first attempt with a 200 and no
    /// cookie, so callers should retry (see `commands::login_with_retry`).
    pub fn login(&self) -> Result<bool> {
        let descriptor =
            endpoints::login_descriptor(&self.credentials.username, &self.credentials.password)?;
        self.send(&descriptor)?;

        let established = self.has_session();
        if established {
            info!("session established with {}", self.host);
        } else {
            debug!("no {} cookie after login to {}", SESSION_COOKIE, self.host);
        }
        Ok(established)
    }

    /// Whether the jar holds a session cookie for `https://{host}`.
    pub fn has_session(&self) -> bool {
        self.cookie(SESSION_COOKIE).is_some()
    }

    /// Value of cookie `name` as it would be sent to the host root.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
    }

    pub fn call(&self, endpoint: &Endpoint) -> Result<Vec<u8>> {
        self.send(&endpoint.descriptor()?)
    }

    pub fn news_feed(&self) -> Result<Vec<u8>> {
        self.call(&Endpoint::NewsFeed)
    }

    pub fn messages(&self) -> Result<Vec<u8>> {
        self.call(&Endpoint::Messages)
    }

    pub fn personal_details(&self) -> Result<Vec<u8>> {
        self.call(&Endpoint::PersonalDetails)
    }

    pub fn check_parent_details(&self) -> Result<Vec<u8>> {
        self.call(&Endpoint::CheckParentDetails)
    }

    /// Parent/teacher interview cycles.
    pub fn pst_cycles(&self) -> Result<Vec<u8>> {
        self.call(&Endpoint::PstCycles)
    }

    pub fn events_for_parent(&self, query: &EventsQuery) -> Result<Vec<u8>> {
        self.call(&Endpoint::EventsForParent(query.clone()))
    }

    /// Raw file contents, not JSON.
    pub fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.call(&Endpoint::FileDownload {
            file_id: file_id.to_string(),
        })
    }

    fn execute(
        &self,
        mut method: Method,
        path: &str,
        headers: &HeaderMap,
        mut body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let mut url = self.url_for(path)?;
        let mut redirects = 0;

        loop {
            let request = self.outbound(method.clone(), url.clone(), headers, body.clone());
            debug!("{} {}", request.method, request.url);
            let response = self.transport.execute(&request)?;
            self.store_cookies(&response, &url);

            let Some(next) = redirect_target(&response, &url) else {
                if !response.status.is_success() {
                    warn!("{} {} returned {}", method, url, response.status);
                }
                return Ok(response.body);
            };

            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return Err(PortalError::Transport {
                    url: url.to_string(),
                    message: format!("more than {} redirects", MAX_REDIRECTS),
                });
            }
            if next.scheme() != "https" || next.host_str() != url.host_str() {
                return Err(PortalError::Transport {
                    url: url.to_string(),
                    message: format!("refusing redirect off https://{} to {}", self.host, next),
                });
            }
            debug!("{} redirect to {}", response.status, next);
            if matches!(
                response.status,
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
            ) {
                method = Method::GET;
                body = None;
            }
            url = next;
        }
    }

    fn outbound(
        &self,
        method: Method,
        url: Url,
        extra: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> OutboundRequest {
        let mut headers = extra.clone();
        headers.remove(COOKIE);
        if let Some(cookies) = self.jar.cookies(&url) {
            headers.insert(COOKIE, cookies);
        }
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        OutboundRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn store_cookies(&self, response: &TransportResponse, url: &Url) {
        let mut set_cookies = response.headers.get_all(SET_COOKIE).iter();
        self.jar.set_cookies(&mut set_cookies, url);
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let raw = format!("https://{}{}", self.host, path);
        Url::parse(&raw)
            .map_err(|e| PortalError::RequestBuild(format!("invalid URL {}: {}", raw, e)))
    }
}

/// `https://{host}/`, provided `host` is a bare hostname (optionally with a
/// port) that ends up as the URL's host unchanged.
fn base_url(host: &str) -> Result<Url> {
    let not_bare = || {
        PortalError::RequestBuild(format!(
            "hostname must be a bare domain like school.compass.education, got {:?}",
            host
        ))
    };
    if host.is_empty()
        || host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '@'))
    {
        return Err(not_bare());
    }

    let url = Url::parse(&format!("https://{}/", host))
        .map_err(|e| PortalError::RequestBuild(format!("invalid hostname {:?}: {}", host, e)))?;
    let name = host.rsplit_once(':').map_or(host, |(name, _)| name);
    let same_host = url
        .host_str()
        .is_some_and(|parsed| parsed.eq_ignore_ascii_case(name));
    if !same_host
        || !url.username().is_empty()
        || url.password().is_some()
        || url.query().is_some()
        || url.fragment().is_some()
        || url.path() != "/"
    {
        return Err(not_bare());
    }
    Ok(url)
}

fn redirect_target(response: &TransportResponse, current: &Url) -> Option<Url> {
    if !response.status.is_redirection() {
        return None;
    }
    let location = response.headers.get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
