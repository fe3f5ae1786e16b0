//! HTTP client adapter.
//!
//! Implements the [`HttpFetch`] port over `EspHttpConnection`.  One
//! connection per request: the release-feed check is two GETs per boot,
//! so connection reuse buys nothing and a fresh connection picks up the
//! per-request timeout cleanly.
//!
//! On the host there is no network stack; every request reports the
//! source unreachable.  Host tests that need responses implement
//! [`HttpFetch`] with canned data instead.

use crate::error::SourceError;
use crate::ports::{HttpFetch, HttpResponse};

pub struct EspHttpFetch;

impl EspHttpFetch {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspHttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl HttpFetch for EspHttpFetch {
    fn get(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        timeout_ms: u32,
    ) -> Result<HttpResponse, SourceError> {
        use embedded_svc::http::client::Client;
        use embedded_svc::http::Method;
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use log::warn;

        let config = Configuration {
            timeout: Some(std::time::Duration::from_millis(u64::from(timeout_ms))),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(|e| {
            warn!("http: connection setup failed: {e}");
            SourceError::Unreachable
        })?;
        let mut client = Client::wrap(connection);

        let request = client.request(Method::Get, url, headers).map_err(|e| {
            warn!("http: GET {url} failed: {e}");
            SourceError::Unreachable
        })?;
        let mut response = request.submit().map_err(|e| {
            warn!("http: GET {url} failed: {e}");
            SourceError::Unreachable
        })?;

        let status = response.status();
        let mut body = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = response.read(&mut buf).map_err(|e| {
                warn!("http: GET {url} read failed: {e}");
                SourceError::Read(std::io::ErrorKind::ConnectionAborted)
            })?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }

        Ok(HttpResponse { status, body })
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpFetch for EspHttpFetch {
    fn get(
        &mut self,
        url: &str,
        _headers: &[(&str, &str)],
        _timeout_ms: u32,
    ) -> Result<HttpResponse, SourceError> {
        log::debug!("http(sim): GET {url} -> unreachable");
        Err(SourceError::Unreachable)
    }
}
