// Outbound HTTP request executor.
//
// Wraps `reqwest::Client` with the bridge's request shape: one fixed
// method for all calls, per-endpoint body and headers, optional Basic
// auth. Exactly one logical request per `execute` call -- transport
// failures are surfaced, never retried. A non-2xx status is a successful
// response at this layer; interpretation belongs to the caller.

use std::collections::HashMap;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, WWW_AUTHENTICATE};
use tracing::{debug, trace};
use url::Url;

use crate::auth::BasicAuth;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP request executor for the bridge's configured endpoints.
pub struct HttpClient {
    http: reqwest::Client,
    method: Method,
    auth: Option<BasicAuth>,
}

impl HttpClient {
    /// Create a client from a transport config.
    ///
    /// The method string is validated here so a typo in the configuration
    /// fails at startup rather than on the first request.
    pub fn new(
        method: &str,
        auth: Option<BasicAuth>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, method, auth)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        method: &str,
        auth: Option<BasicAuth>,
    ) -> Result<Self, Error> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidMethod(method.to_owned()))?;
        // Empty-username credentials behave as no credentials at all.
        let auth = auth.filter(BasicAuth::is_configured);
        Ok(Self { http, method, auth })
    }

    /// The method used for every outbound request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Execute one request against `url`.
    ///
    /// Explicitly configured headers override the generated Basic-auth
    /// header. When credentials are configured with `preemptive = false`,
    /// the first attempt is sent bare and resent once with credentials
    /// after a 401 challenge -- the single resend is part of the auth
    /// handshake, not a retry.
    pub async fn execute(
        &self,
        url: &Url,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, Error> {
        let extra = build_header_map(headers)?;

        let send_preemptive = self.auth.as_ref().is_some_and(|a| a.preemptive);
        let resp = self.dispatch(url, body, &extra, send_preemptive).await?;

        // Challenge-response flow for non-preemptive credentials.
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            && !send_preemptive
            && self.auth.is_some()
            && resp.headers().contains_key(WWW_AUTHENTICATE)
        {
            trace!(%url, "401 challenge received, resending with credentials");
            let resp = self.dispatch(url, body, &extra, true).await?;
            return Self::collect(resp).await;
        }

        Self::collect(resp).await
    }

    async fn dispatch(
        &self,
        url: &Url,
        body: &str,
        extra: &HeaderMap,
        with_auth: bool,
    ) -> Result<reqwest::Response, Error> {
        debug!("{} {}", self.method, url);

        let mut builder = self.http.request(self.method.clone(), url.clone());
        if with_auth {
            if let Some(ref auth) = self.auth {
                builder = builder.basic_auth(&auth.username, Some(auth.expose_password()));
            }
        }
        // Applied after basic_auth so an explicit Authorization header wins.
        builder = builder.headers(extra.clone());
        if !body.is_empty() {
            builder = builder.body(body.to_owned());
        }

        builder.send().await.map_err(Error::Transport)
    }

    async fn collect(resp: reqwest::Response) -> Result<HttpResponse, Error> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status, body_len = body.len(), "response collected");
        Ok(HttpResponse { status, body })
    }
}

fn build_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
