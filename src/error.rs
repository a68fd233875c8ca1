// Error taxonomy for the portal client. Every failure the library can
// produce ends up as one `PortalError`; the binaries wrap it in `anyhow`
// and print it on stderr.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    /// The request could not be constructed (bad host/URL, body
    /// serialization).
    #[error("could not build request: {0}")]
    RequestBuild(String),

    /// The network call failed (DNS, connection, TLS, redirect loop).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be fully read.
    #[error("could not read response body from {url}: {message}")]
    Read { url: String, message: String },

    /// Every login attempt completed but none produced a session cookie.
    #[error("login failed: no session cookie after {attempts} attempt(s)")]
    Authentication { attempts: u32 },
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::RequestBuild(format!("serializing body: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_names_attempts() {
        let err = PortalError::Authentication { attempts: 2 };
        assert_eq!(
            err.to_string(),
            "login failed: no session cookie after 2 attempt(s)"
        );
    }

    #[test]
    fn transport_message_includes_url() {
        let err = PortalError::Transport {
            url: "https://school.example/x".into(),
            message: "connection refused".into(),
        };
        assert!(err.to_string().contains("https://school.example/x"));
        assert!(err.to_string().contains("connection refused"));
    }
}
