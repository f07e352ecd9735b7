use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{self, Credentials};
use crate::environment::ApiSettings;
use crate::error::IntakeError;
use crate::payload::QueryParams;

use super::response::ApiResponse;

/// Thin wrapper over `reqwest` for the intake API.
///
/// Holds the base URL, the shared timeout, and an optional bearer token.
/// Retries are transport-level only; HTTP error statuses are returned to
/// the caller untouched.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    retry_count: u32,
    retry_delay: Duration,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, IntakeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry_count: settings.retry_count,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            token: None,
            client,
        })
    }

    /// Install or clear the bearer token used by subsequent requests.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url_for(&self, path: &str, params: &QueryParams) -> Result<reqwest::Url, IntakeError> {
        let raw = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        };

        let mut url = reqwest::Url::parse(&raw).map_err(|err| IntakeError::InvalidUrl {
            url: raw,
            message: err.to_string(),
        })?;

        if !params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params.pairs() {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// POST to `path` with the query mapping appended, retrying transport
    /// failures with a fixed delay between attempts.
    pub async fn post_query(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<ApiResponse, IntakeError> {
        let url = self.url_for(path, params)?;
        debug!(url = %url, params = %params.summary(), "POST");

        let mut attempt = 0u32;
        loop {
            let mut request = self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/json")
                .body("{}");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let started = Instant::now();
            match request.send().await {
                Ok(response) => {
                    let captured = capture(response, started).await?;
                    debug!(
                        status = captured.status,
                        elapsed_ms = captured.duration_ms,
                        size = captured.size_bytes,
                        "response"
                    );
                    return Ok(captured);
                }
                Err(err) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(attempt, error = %err, "retrying after transport failure");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(IntakeError::Request(err)),
            }
        }
    }

    /// Like [`post_query`](Self::post_query), but converts HTTP 401 into an
    /// error to exercise auth branches.
    pub async fn post_query_authorized(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<ApiResponse, IntakeError> {
        let response = self.post_query(path, params).await?;
        if response.status == 401 {
            return Err(IntakeError::Unauthorized);
        }
        Ok(response)
    }

    /// Log in and install the returned bearer token.
    ///
    /// Returns the full login response body for callers that need more than
    /// the token.
    pub async fn authenticate(
        &mut self,
        path: &str,
        user_name: &str,
        password: &str,
    ) -> Result<Value, IntakeError> {
        let url = self.url_for(path, &QueryParams::default())?;
        let credentials = Credentials::new(user_name, password);

        let response = self.client.post(url).json(&credentials).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.as_u16() != 200 {
            return Err(IntakeError::AuthFailed {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body)?;
        let token = auth::extract_token(&data).ok_or(IntakeError::TokenMissing)?;
        self.set_token(Some(token));
        Ok(data)
    }
}

async fn capture(response: reqwest::Response, started: Instant) -> Result<ApiResponse, IntakeError> {
    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();

    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        headers.insert(
            key.to_string(),
            value.to_str().unwrap_or_default().to_string(),
        );
    }

    let bytes = response.bytes().await?;
    let elapsed = started.elapsed().as_millis() as u64;
    let body = String::from_utf8_lossy(&bytes).into_owned();

    Ok(ApiResponse {
        status: status.as_u16(),
        status_text,
        headers,
        duration_ms: elapsed,
        size_bytes: bytes.len() as u64,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::CustomPayload;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ApiSettings {
        ApiSettings {
            base_url: server.uri(),
            retry_count: 0,
            retry_delay_ms: 0,
            ..ApiSettings::default()
        }
    }

    fn full_params() -> QueryParams {
        CustomPayload::new()
            .file_url("https://example.com/community-guide.pdf")
            .file_type("community")
            .file_id("community_001")
            .builder_id("builder_alpha")
            .entity_id("entity_alpha")
            .build()
    }

    #[tokio::test]
    async fn post_query_sends_params_and_captures_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/intelligent-builder-intake/process"))
            .and(query_param("file_id", "community_001"))
            .and(query_param("file_type", "community"))
            .and(body_string("{}"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "session_id": "sess-1",
                "response_time": 42.0,
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&settings_for(&server)).unwrap();
        let response = client
            .post_query("/api/v1/intelligent-builder-intake/process", &full_params())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert!(response.size_bytes > 0);

        let reply = response.decode_process_reply().unwrap();
        assert_eq!(reply.status, "SUCCESS");
        assert_eq!(reply.session_id, "sess-1");
    }

    #[tokio::test]
    async fn post_query_returns_http_errors_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": ["missing file_url"]})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&settings_for(&server)).unwrap();
        let params = CustomPayload::new().file_type("community").build();
        let response = client.post_query("/process", &params).await.unwrap();

        assert_eq!(response.status, 422);
        let detail = response.json().unwrap();
        assert!(detail["detail"].is_array());
    }

    #[tokio::test]
    async fn authorized_variant_rejects_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ApiClient::new(&settings_for(&server)).unwrap();
        let err = client
            .post_query_authorized("/process", &full_params())
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Unauthorized));
    }

    #[tokio::test]
    async fn authenticate_installs_bearer_token_for_later_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/Authenticate/Login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(202).set_body_string("{}"))
            .mount(&server)
            .await;

        let mut client = ApiClient::new(&settings_for(&server)).unwrap();
        client
            .authenticate("/api/Authenticate/Login", "admin", "password123")
            .await
            .unwrap();

        let response = client
            .post_query("/process", &full_params())
            .await
            .unwrap();
        assert_eq!(response.status, 202);
    }

    #[tokio::test]
    async fn authenticate_fails_without_token_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let mut client = ApiClient::new(&settings_for(&server)).unwrap();
        let err = client
            .authenticate("/login", "admin", "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::TokenMissing));
    }

    #[tokio::test]
    async fn authenticate_propagates_login_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let mut client = ApiClient::new(&settings_for(&server)).unwrap();
        let err = client
            .authenticate("/login", "admin", "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::AuthFailed { status: 403, .. }));
    }

    #[tokio::test]
    async fn absolute_urls_bypass_the_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/elsewhere"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let mut settings = settings_for(&server);
        settings.base_url = "https://unreachable.invalid".into();
        let client = ApiClient::new(&settings).unwrap();

        let absolute = format!("{}/elsewhere", server.uri());
        let response = client
            .post_query(&absolute, &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}
