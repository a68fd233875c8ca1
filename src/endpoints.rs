// Endpoint catalog: the fixed set of portal operations, each mapped to a
// request descriptor. Nothing here touches the network; `PortalClient`
// executes the descriptors.

use crate::error::Result;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

pub const PATH_AUTH: &str = "/services/admin.svc/AuthenticateUserCredentials";
pub const PATH_NEWSFEED: &str = "/services/mobile.svc/GetNewsFeed?sessionstate=readonly";
pub const PATH_GET_MESSAGES: &str = "/services/mobile.svc/GetMessages?sessionstate=readonly";
pub const PATH_GET_PERSONAL_DETAILS: &str =
    "/services/mobile.svc/GetPersonalDetails?sessionstate=readonly";
pub const PATH_CHECK_PARENT_DETAILS: &str =
    "/services/mobile.svc/CheckParentDetails?sessionstate=readonly";
pub const PATH_PST_CYCLES: &str = "/services/mobile.svc/GetPstCycles?sessionstate=readonly";
pub const PATH_GET_EVENTS_FOR_PARENT: &str = "/Services/Events.svc/GetForParent";
pub const PATH_DOWNLOAD_FILE: &str = "/services/FileDownload/FileRequestHandler";

pub const DEFAULT_EVENTS_LIMIT: u32 = 20;
pub const DEFAULT_EVENTS_PAGE: u32 = 1;

/// Method, service-relative path, extra headers and optional body of one
/// call. The session client adds the user agent and cookies on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn post(path: impl Into<String>) -> Self {
        RequestDescriptor {
            method: Method::POST,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        RequestDescriptor {
            method: Method::GET,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Serialize `payload` as the body and mark it as JSON.
    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        let body = serde_json::to_vec(payload)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        Ok(self)
    }
}

/// Login payload. Field order is the wire order.
#[derive(Serialize)]
pub struct LoginCredentials<'a> {
    pub sessionstate: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Parameters of the events-for-parent call.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EventsQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub limit: u32,
    pub page: u32,
}

impl EventsQuery {
    /// Query for `user_id` with the default limit and page.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        EventsQuery {
            user_id: user_id.into(),
            limit: DEFAULT_EVENTS_LIMIT,
            page: DEFAULT_EVENTS_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    NewsFeed,
    Messages,
    PersonalDetails,
    CheckParentDetails,
    PstCycles,
    EventsForParent(EventsQuery),
    /// `file_id` goes into the query string as given, without escaping, so
    /// an id containing `&` or `#` changes the query the portal sees.
    /// Portal file ids are numeric.
    FileDownload { file_id: String },
}

impl Endpoint {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        match self {
            Endpoint::NewsFeed => Ok(RequestDescriptor::post(PATH_NEWSFEED)),
            Endpoint::Messages => Ok(RequestDescriptor::post(PATH_GET_MESSAGES)),
            Endpoint::PersonalDetails => Ok(RequestDescriptor::post(PATH_GET_PERSONAL_DETAILS)),
            Endpoint::CheckParentDetails => Ok(RequestDescriptor::post(PATH_CHECK_PARENT_DETAILS)),
            Endpoint::PstCycles => Ok(RequestDescriptor::post(PATH_PST_CYCLES)),
            Endpoint::EventsForParent(query) => {
                RequestDescriptor::post(PATH_GET_EVENTS_FOR_PARENT).json(query)
            }
            Endpoint::FileDownload { file_id } => Ok(RequestDescriptor::get(format!(
                "{}?FileDownloadType=1&file={}",
                PATH_DOWNLOAD_FILE, file_id
            ))),
        }
    }
}

/// Descriptor for the authentication call.
pub fn login_descriptor(username: &str, password: &str) -> Result<RequestDescriptor> {
    let credentials = LoginCredentials {
        sessionstate: "readonly",
        username,
        password,
    };
    RequestDescriptor::post(PATH_AUTH).json(&credentials)
}
