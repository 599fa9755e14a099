//! The transport seam between the builder and the network.
//!
//! # Design
//! The builder never performs I/O itself. It hands a plain-data
//! `HttpRequest` to a `Transport`, whose `method` tag selects the verb, and
//! interprets the `HttpResponse` it gets back. Non-2xx statuses must be
//! returned as responses, not errors; `Err` is reserved for exchanges that
//! never produced a response.
//!
//! `UreqTransport` (feature `ureq`, on by default) is the stock
//! implementation. It owns an origin that is prefixed to every request path
//! and a set of default headers, and runs ureq's blocking calls on tokio's
//! blocking pool.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes HTTP exchanges on behalf of an `ApiBuilder`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::fmt;

    use async_trait::async_trait;
    use tracing::trace;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// `Transport` backed by a ureq agent.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
        origin: String,
        default_headers: Vec<(String, String)>,
    }

    impl UreqTransport {
        /// Transport for `origin`, sending `content-type: application/json`
        /// by default. A trailing slash on `origin` is stripped.
        pub fn new(origin: &str) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();

            Self {
                agent,
                origin: origin.trim_end_matches('/').to_string(),
                default_headers: vec![("content-type".to_string(), "application/json".to_string())],
            }
        }

        pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.default_headers.push((name.into(), value.into()));
            self
        }

        pub fn origin(&self) -> &str {
            &self.origin
        }

        /// Default headers not overridden by the request, then the request's own.
        fn merged_headers(&self, request: &HttpRequest) -> Vec<(String, String)> {
            let mut headers: Vec<(String, String)> = self
                .default_headers
                .iter()
                .filter(|(name, _)| {
                    !request
                        .headers
                        .iter()
                        .any(|(own, _)| own.eq_ignore_ascii_case(name))
                })
                .cloned()
                .collect();
            headers.extend(request.headers.iter().cloned());
            headers
        }
    }

    impl fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UreqTransport")
                .field("origin", &self.origin)
                .field("default_headers", &self.default_headers)
                .finish()
        }
    }

    #[async_trait]
    impl Transport for UreqTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let agent = self.agent.clone();
            let url = format!("{}{}", self.origin, request.path);
            let headers = self.merged_headers(&request);
            let method = request.method;
            let body = request.body;

            trace!(%method, %url, "dispatching to ureq");
            tokio::task::spawn_blocking(move || execute(&agent, method, &url, &headers, body))
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
        }
    }

    fn execute(
        agent: &ureq::Agent,
        method: HttpMethod,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let result = match method {
            HttpMethod::Get => with_headers(agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(agent.post(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(agent.put(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn origin_trailing_slash_is_stripped() {
            let transport = UreqTransport::new("http://localhost:3000/");
            assert_eq!(transport.origin(), "http://localhost:3000");
        }

        #[test]
        fn request_headers_override_defaults_case_insensitively() {
            let transport = UreqTransport::new("http://x").with_header("x-client", "cards");
            let request = HttpRequest {
                method: HttpMethod::Post,
                path: "/cards".to_string(),
                headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                body: Some("hi".to_string()),
            };

            let headers = transport.merged_headers(&request);
            assert_eq!(
                headers,
                vec![
                    ("x-client".to_string(), "cards".to_string()),
                    ("Content-Type".to_string(), "text/plain".to_string()),
                ]
            );
        }
    }
}
