// Library root
// -----------
// This crate exposes the Compass portal client to the two binaries
// (`compass` and `compass-news`), which stay thin wrappers over it.
//
// Module responsibilities:
// - `api`: the session client. Credentials, host, cookie jar, raw GET/POST,
//   login and the endpoint methods.
// - `endpoints`: the fixed catalog of portal operations as request
//   descriptors. No I/O.
// - `transport`: the network seam (`Transport` trait, reqwest-backed
//   `HttpTransport`).
// - `error`: the `PortalError` taxonomy.
// - `cli` / `commands`: argument definitions, login retry policy and
//   output handling shared by the binaries.
// - `logger`: stderr logging setup.
pub mod api;
pub mod cli;
pub mod commands;
pub mod endpoints;
pub mod error;
pub mod logger;
pub mod transport;

pub use api::{Credentials, PortalClient};
pub use endpoints::{Endpoint, EventsQuery, RequestDescriptor};
pub use error::PortalError;
pub use transport::{HttpTransport, OutboundRequest, Transport, TransportResponse};
