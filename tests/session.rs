// End-to-end behaviour of the portal client against an in-memory portal.

use compass_cli::cli::{Command, PortalArgs};
use compass_cli::commands::{self, LOGIN_ATTEMPTS};
use compass_cli::endpoints::PATH_AUTH;
use compass_cli::{
    Credentials, EventsQuery, OutboundRequest, PortalClient, PortalError, Transport,
    TransportResponse,
};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::{Method, StatusCode};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

const HOST: &str = "coburg-north-ps-vic.compass.education";

/// Fake portal. Authentication attempt `n` sets the session cookie iff
/// `cookie_on_attempt[n]` is true; other paths answer from `bodies`.
#[derive(Default)]
struct FakePortal {
    cookie_on_attempt: Vec<bool>,
    fail_attempt: Option<usize>,
    bodies: HashMap<String, Vec<u8>>,
    auth_calls: Cell<usize>,
    requests: RefCell<Vec<OutboundRequest>>,
}

impl FakePortal {
    fn with_login(cookie_on_attempt: &[bool]) -> Self {
        FakePortal {
            cookie_on_attempt: cookie_on_attempt.to_vec(),
            ..Default::default()
        }
    }

    fn body(mut self, path_and_query: &str, body: &[u8]) -> Self {
        self.bodies.insert(path_and_query.to_string(), body.to_vec());
        self
    }

    fn last_request(&self) -> OutboundRequest {
        self.requests.borrow().last().cloned().expect("no request sent")
    }
}

impl Transport for FakePortal {
    fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, PortalError> {
        self.requests.borrow_mut().push(request.clone());

        if request.url.path() == PATH_AUTH {
            let attempt = self.auth_calls.get();
            self.auth_calls.set(attempt + 1);
            if self.fail_attempt == Some(attempt) {
                return Err(PortalError::Transport {
                    url: request.url.to_string(),
                    message: "connection reset".into(),
                });
            }
            let mut response = TransportResponse::ok("{\"d\":null}");
            if self.cookie_on_attempt.get(attempt).copied().unwrap_or(false) {
                response.headers.insert(
                    SET_COOKIE,
                    HeaderValue::from_static("ASP.NET_SessionId=abc; path=/; HttpOnly"),
                );
            }
            return Ok(response);
        }

        let key = match request.url.query() {
            Some(q) => format!("{}?{}", request.url.path(), q),
            None => request.url.path().to_string(),
        };
        Ok(match self.bodies.get(&key) {
            Some(body) => TransportResponse::ok(body.clone()),
            None => TransportResponse {
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                body: Vec::new(),
            },
        })
    }
}

fn client(portal: FakePortal) -> PortalClient<FakePortal> {
    PortalClient::with_transport(Credentials::new("jdoe", "hunter2"), HOST, portal).unwrap()
}

#[test]
fn login_succeeds_when_session_cookie_is_set() {
    let c = client(FakePortal::with_login(&[true]));
    assert!(c.login().unwrap());
    assert!(c.has_session());

    let req = c.transport().last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.url.as_str(),
        format!("https://{}/services/admin.svc/AuthenticateUserCredentials", HOST)
    );
    assert_eq!(
        req.body.as_deref(),
        Some(&br#"{"sessionstate":"readonly","username":"jdoe","password":"hunter2"}"#[..])
    );
    assert_eq!(req.headers["content-type"], "application/json");
}

#[test]
fn login_fails_without_session_cookie() {
    let c = client(FakePortal::with_login(&[false]));
    assert!(!c.login().unwrap());
    assert!(!c.has_session());
}

#[test]
fn retry_recovers_from_swallowed_first_attempt() {
    let c = client(FakePortal::with_login(&[false, true]));
    commands::login_with_retry(&c, LOGIN_ATTEMPTS).unwrap();
    assert_eq!(c.transport().auth_calls.get(), 2);
}

#[test]
fn retry_gives_up_after_two_attempts() {
    let c = client(FakePortal::with_login(&[false, false, true]));
    let err = commands::login_with_retry(&c, LOGIN_ATTEMPTS).unwrap_err();
    assert!(matches!(err, PortalError::Authentication { attempts: 2 }));
    assert_eq!(c.transport().auth_calls.get(), 2);
}

#[test]
fn retry_stops_after_first_success() {
    let c = client(FakePortal::with_login(&[true, true]));
    commands::login_with_retry(&c, LOGIN_ATTEMPTS).unwrap();
    assert_eq!(c.transport().auth_calls.get(), 1);
}

#[test]
fn transport_error_on_first_attempt_is_retried() {
    let portal = FakePortal {
        fail_attempt: Some(0),
        ..FakePortal::with_login(&[false, true])
    };
    let c = client(portal);
    commands::login_with_retry(&c, LOGIN_ATTEMPTS).unwrap();
    assert_eq!(c.transport().auth_calls.get(), 2);
}

#[test]
fn transport_error_on_last_attempt_is_propagated() {
    let portal = FakePortal {
        fail_attempt: Some(1),
        ..FakePortal::with_login(&[false, false])
    };
    let c = client(portal);
    let err = commands::login_with_retry(&c, LOGIN_ATTEMPTS).unwrap_err();
    assert!(matches!(err, PortalError::Transport { .. }));
}

#[test]
fn session_cookie_is_replayed_on_endpoint_calls() {
    let c = client(
        FakePortal::with_login(&[true])
            .body("/services/mobile.svc/GetMessages?sessionstate=readonly", b"[]"),
    );
    c.login().unwrap();
    assert_eq!(c.messages().unwrap(), b"[]");

    let req = c.transport().last_request();
    assert_eq!(req.headers[COOKIE], "ASP.NET_SessionId=abc");
    assert_eq!(req.headers[USER_AGENT], "Go API/v1");
}

#[test]
fn no_cookie_is_sent_before_login() {
    let c = client(FakePortal::default());
    c.personal_details().unwrap();
    assert!(c.transport().last_request().headers.get(COOKIE).is_none());
}

#[test]
fn same_call_twice_sends_identical_requests() {
    let c = client(FakePortal::with_login(&[true]));
    c.login().unwrap();
    let query = EventsQuery::for_user("123");
    c.events_for_parent(&query).unwrap();
    c.events_for_parent(&query).unwrap();

    let requests = c.transport().requests.borrow();
    let n = requests.len();
    assert_eq!(requests[n - 1], requests[n - 2]);
    assert_eq!(requests[n - 1].url.path(), "/Services/Events.svc/GetForParent");
    assert_eq!(
        requests[n - 1].body.as_deref(),
        Some(&br#"{"userId":"123","limit":20,"page":1}"#[..])
    );
}

#[test]
fn news_feed_body_is_passed_through() {
    let feed = br#"{"d":[{"Title":"Sports day","Content":"<p>Bring a hat</p>"}]}"#;
    let c = client(
        FakePortal::with_login(&[true])
            .body("/services/mobile.svc/GetNewsFeed?sessionstate=readonly", feed),
    );
    c.login().unwrap();
    assert_eq!(c.news_feed().unwrap(), feed.to_vec());
}

#[test]
fn file_download_returns_exact_bytes() {
    let pdf: Vec<u8> = vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff, 0xfe, 0x0a, 0x80];
    let c = client(FakePortal::with_login(&[true]).body(
        "/services/FileDownload/FileRequestHandler?FileDownloadType=1&file=215",
        &pdf,
    ));
    c.login().unwrap();
    assert_eq!(c.download_file("215").unwrap(), pdf);
    assert_eq!(c.transport().last_request().method, Method::GET);
}

#[test]
fn clients_do_not_share_cookies() {
    let a = client(FakePortal::with_login(&[true]));
    let b = client(FakePortal::with_login(&[false]));
    a.login().unwrap();
    assert!(a.has_session());
    assert!(!b.has_session());
}

fn portal_args() -> PortalArgs {
    PortalArgs {
        username: "jdoe".into(),
        password: Some("hunter2".into()),
        hostname: HOST.into(),
    }
}

#[test]
fn json_commands_print_body_and_newline() {
    let c = client(
        FakePortal::with_login(&[true])
            .body("/services/mobile.svc/GetPstCycles?sessionstate=readonly", b"{\"d\":[]}"),
    );
    c.login().unwrap();

    let mut out = Vec::new();
    commands::execute(&c, &Command::GetPstCycles(portal_args()), &mut out).unwrap();
    assert_eq!(out, b"{\"d\":[]}\n");
}

#[test]
fn download_command_writes_raw_bytes() {
    let c = client(FakePortal::with_login(&[true]).body(
        "/services/FileDownload/FileRequestHandler?FileDownloadType=1&file=7",
        b"\x00\x01binary",
    ));
    c.login().unwrap();

    let mut out = Vec::new();
    let command = Command::DownloadFile {
        portal: portal_args(),
        file_id: "7".into(),
        output: None,
    };
    commands::execute(&c, &command, &mut out).unwrap();
    assert_eq!(out, b"\x00\x01binary");
}

#[test]
fn download_command_writes_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notice.pdf");
    let c = client(FakePortal::with_login(&[true]).body(
        "/services/FileDownload/FileRequestHandler?FileDownloadType=1&file=9",
        b"%PDF-1.4",
    ));
    c.login().unwrap();

    let mut out = Vec::new();
    let command = Command::DownloadFile {
        portal: portal_args(),
        file_id: "9".into(),
        output: Some(path.clone()),
    };
    commands::execute(&c, &command, &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
}

#[test]
fn events_command_uses_paging_flags() {
    let c = client(FakePortal::with_login(&[true]));
    c.login().unwrap();

    let mut out = Vec::new();
    let command = Command::GetEventsForParent {
        portal: portal_args(),
        user_id: "55".into(),
        limit: 5,
        page: 2,
    };
    commands::execute(&c, &command, &mut out).unwrap();
    assert_eq!(
        c.transport().last_request().body.as_deref(),
        Some(&br#"{"userId":"55","limit":5,"page":2}"#[..])
    );
}
