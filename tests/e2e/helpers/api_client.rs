use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{body::Bytes, HeaderMap, Method, Request, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::Value;

/// Thin hyper client pointed at one test server
#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    inner: Client<HttpConnector, Full<Bytes>>,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            inner: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, Bytes::new(), &[]).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.post_with_headers(path, body, &[]).await
    }

    /// POST as a specific client, e.g. behind a proxy with `x-forwarded-for`
    pub async fn post_with_headers<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let json = serde_json::to_vec(body)?;
        self.send(Method::POST, path, Bytes::from(json), headers).await
    }

    /// POST bytes as-is with a JSON content type, for malformed payloads
    pub async fn post_raw(&self, path: &str, body: &str) -> Result<ApiResponse> {
        self.send(Method::POST, path, Bytes::copy_from_slice(body.as_bytes()), &[])
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Bytes,
        extra_headers: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.base_url, path));

        if !body.is_empty() {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
        }
        for (name, value) in extra_headers {
            builder = builder.header(HeaderName::try_from(*name)?, HeaderValue::try_from(*value)?);
        }

        let response = self.inner.request(builder.body(Full::new(body))?).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response.into_body().collect().await?.to_bytes().to_vec();

        Ok(ApiResponse::new(status, headers, body_bytes))
    }
}

/// Buffered response. `body` is the parsed JSON when the payload is JSON.
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub body_bytes: Vec<u8>,
    headers: HeaderMap,
}

impl ApiResponse {
    fn new(status: StatusCode, headers: HeaderMap, body_bytes: Vec<u8>) -> Self {
        let body = serde_json::from_slice(&body_bytes).ok();
        Self {
            status,
            body,
            body_bytes,
            headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body_bytes)
        );
        self
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        match self.header(name) {
            Some(actual) => assert_eq!(actual, expected, "header '{}' mismatch", name),
            None => panic!("header '{}' missing", name),
        }
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(self.headers.contains_key(name), "header '{}' missing", name);
        self
    }

    /// The JSON `error` field mentions `fragment`
    pub fn assert_error_message(&self, fragment: &str) -> &Self {
        let message = self
            .body
            .as_ref()
            .and_then(|body| body["error"].as_str())
            .unwrap_or_else(|| panic!("no error message in {:?}", self.body));
        assert!(
            message.contains(fragment),
            "error '{}' does not mention '{}'",
            message,
            fragment
        );
        self
    }
}
