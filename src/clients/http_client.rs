//! The Panoptes API client.
//!
//! This module provides [`Panoptes`], which combines the authenticated
//! session (login, bearer token acquisition and refresh) with the request
//! dispatcher (header composition, verb wrappers, error unwrapping).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::auth::{AuthState, TokenResponse};
use crate::clients::errors::ClientError;
use crate::clients::http_response::ApiResponse;
use crate::config::PanoptesConfig;
use crate::rest::LinkRegistry;

/// Path prefix for resource calls, appended to the endpoint.
const API_PATH: &str = "/api";

/// Versioned accept header sent with every resource request.
const API_ACCEPT: &str = "application/vnd.api+json; version=1";

/// The process-wide active client, installed by [`Panoptes::connect`] or
/// lazily by [`Panoptes::client`].
static ACTIVE_CLIENT: RwLock<Option<Arc<Panoptes>>> = RwLock::new(None);

/// HTTP methods supported by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
}

/// Query parameters for a request.
pub type Params = HashMap<String, String>;

/// Extra headers for a request.
pub type Headers = HashMap<String, String>;

/// A client for the Panoptes API.
///
/// One instance owns one HTTP session (with its cookie jar, since the
/// sign-in flow is cookie based) and one set of authentication state. Everything in
/// the crate takes an explicit `&Panoptes`; the process-wide accessor
/// ([`Panoptes::client`]) exists only as an application-boundary
/// convenience.
///
/// # Anonymous mode
///
/// A configuration without credentials puts the client in anonymous
/// read-only mode: [`login`](Self::login) is a silent no-op,
/// [`get_bearer_token`](Self::get_bearer_token) returns `None`, and
/// requests go out unauthenticated.
///
/// # Concurrency
///
/// The model is sequential and blocking-per-call: every request awaits its
/// response, and there is no background refresh. The auth state sits behind
/// a mutex so `&self` methods can refresh tokens, but callers are expected
/// to drive one logical flow at a time (one client per task if in doubt).
///
/// # Example
///
/// ```rust,ignore
/// use panoptes_api::{Panoptes, PanoptesConfig};
/// use panoptes_api::rest::{Resource, resources::Project};
///
/// let config = PanoptesConfig::builder()
///     .username("example")
///     .password("hunter2")
///     .build()?;
/// let client = Panoptes::new(config);
///
/// let mut projects = Resource::<Project>::find(&client, None, None).await?;
/// while let Some(project) = projects.next().await? {
///     println!("{:?}", project.attr("display_name")?);
/// }
/// ```
#[derive(Debug)]
pub struct Panoptes {
    /// The underlying HTTP session.
    http: reqwest::Client,
    /// Endpoint, client id, and stored credentials.
    config: PanoptesConfig,
    /// Login and token state, mutated by the auth flows.
    auth: Mutex<AuthState>,
    /// Relationship slug registrations for link resolution.
    registry: LinkRegistry,
}

// Verify Panoptes is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Panoptes>();
};

impl Panoptes {
    /// Creates a client for the given configuration, with the default link
    /// registry.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This
    /// should only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(config: PanoptesConfig) -> Self {
        Self::with_registry(config, LinkRegistry::with_defaults())
    }

    /// Creates a client with a caller-supplied link registry.
    ///
    /// Use this when registering resource types of your own.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created.
    #[must_use]
    pub fn with_registry(config: PanoptesConfig, registry: LinkRegistry) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        let auth = AuthState::new(
            config.username().map(ToString::to_string),
            config.password().map(ToString::to_string),
        );

        Self {
            http,
            config,
            auth: Mutex::new(auth),
            registry,
        }
    }

    /// Constructs a client and installs it as the process-wide active
    /// instance.
    pub fn connect(config: PanoptesConfig) -> Arc<Self> {
        let client = Arc::new(Self::new(config));
        *ACTIVE_CLIENT
            .write()
            .expect("active client lock poisoned") = Some(Arc::clone(&client));
        client
    }

    /// Returns the process-wide active client, lazily installing an
    /// anonymous default instance on first use.
    ///
    /// This is an application-boundary convenience; library code should
    /// take an explicit `&Panoptes` instead.
    pub fn client() -> Arc<Self> {
        if let Some(client) = ACTIVE_CLIENT
            .read()
            .expect("active client lock poisoned")
            .as_ref()
        {
            return Arc::clone(client);
        }

        let mut guard = ACTIVE_CLIENT
            .write()
            .expect("active client lock poisoned");
        if let Some(client) = guard.as_ref() {
            return Arc::clone(client);
        }
        let client = Arc::new(Self::new(PanoptesConfig::default()));
        *guard = Some(Arc::clone(&client));
        client
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &PanoptesConfig {
        &self.config
    }

    /// Returns the link registry this client consults for relationship
    /// resolution.
    #[must_use]
    pub const fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    /// Returns `true` if a sign-in has succeeded on this client.
    pub async fn logged_in(&self) -> bool {
        self.auth.lock().await.logged_in()
    }

    /// Sends a request to the API and returns the raw response.
    ///
    /// Headers are composed in layers: verb-independent defaults (the
    /// versioned accept header), verb defaults (PUT/POST declare a JSON
    /// content type), then caller-supplied headers, later layers overriding
    /// earlier ones. When the session is authenticated a freshly ensured
    /// bearer token is attached; a supplied `etag` becomes an `If-Match`
    /// precondition.
    ///
    /// The target URL is `<endpoint>/api<path>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Server`] for status codes >= 500 and
    /// [`ClientError::Network`] for transport failures. 4xx responses are
    /// not raised here; that is deferred to [`json_request`](Self::json_request).
    pub async fn http_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let mut composed = compose_headers(method, headers);

        if let Some(token) = self.get_bearer_token().await? {
            composed.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        if let Some(etag) = etag {
            composed.insert("If-Match".to_string(), etag.to_string());
        }

        let url = format!("{}{}{}", self.config.endpoint(), API_PATH, path);
        let mut request = match method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
        };
        for (key, value) in &composed {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if status >= 500 {
            tracing::warn!(status, %url, "server error from API");
            return Err(ClientError::Server { status });
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await?;

        Ok(ApiResponse { status, etag, body })
    }

    /// Sends a request and parses the response as JSON, unwrapping the API
    /// error envelope.
    ///
    /// Returns the parsed body together with the response's `ETag` header
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the payload carries an `errors`
    /// field (message is the comma-joined set of individual error messages,
    /// a missing message defaulting to the empty string), or when the
    /// status is not 2xx even without an envelope. Propagates
    /// [`http_request`](Self::http_request) errors.
    pub async fn json_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<(Value, Option<String>), ClientError> {
        let response = self
            .http_request(method, path, params, headers, body, etag)
            .await?;
        let parsed: Value = response.json()?;

        if let Some(errors) = parsed.get("errors") {
            let message = join_error_messages(errors);
            tracing::warn!(status = response.status, %message, path, "API error");
            return Err(ClientError::Api { message });
        }
        if !response.is_success() {
            // Some 4xx responses come without an errors envelope; they are
            // still surfaced as API errors rather than passed through.
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .map_or_else(
                    || format!("Received HTTP status code {} from API", response.status),
                    ToString::to_string,
                );
            return Err(ClientError::Api { message });
        }

        Ok((parsed, response.etag))
    }

    /// Sends a GET request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Propagates [`http_request`](Self::http_request) errors.
    pub async fn get_request(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
    ) -> Result<ApiResponse, ClientError> {
        self.http_request(HttpMethod::Get, path, params, headers, None, None)
            .await
    }

    /// Sends a GET request and returns the parsed body plus `ETag`.
    ///
    /// # Errors
    ///
    /// Propagates [`json_request`](Self::json_request) errors.
    pub async fn get(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
    ) -> Result<(Value, Option<String>), ClientError> {
        self.json_request(HttpMethod::Get, path, params, headers, None, None)
            .await
    }

    /// Sends a PUT request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Propagates [`http_request`](Self::http_request) errors.
    pub async fn put_request(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        self.http_request(HttpMethod::Put, path, params, headers, body, etag)
            .await
    }

    /// Sends a PUT request and returns the parsed body plus `ETag`.
    ///
    /// # Errors
    ///
    /// Propagates [`json_request`](Self::json_request) errors.
    pub async fn put(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<(Value, Option<String>), ClientError> {
        self.json_request(HttpMethod::Put, path, params, headers, body, etag)
            .await
    }

    /// Sends a POST request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Propagates [`http_request`](Self::http_request) errors.
    pub async fn post_request(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        self.http_request(HttpMethod::Post, path, params, headers, body, etag)
            .await
    }

    /// Sends a POST request and returns the parsed body plus `ETag`.
    ///
    /// # Errors
    ///
    /// Propagates [`json_request`](Self::json_request) errors.
    pub async fn post(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<(Value, Option<String>), ClientError> {
        self.json_request(HttpMethod::Post, path, params, headers, body, etag)
            .await
    }

    /// Signs in with the stored (or supplied) credentials.
    ///
    /// Supplied credentials replace the stored ones. If either credential
    /// is still absent, returns `Ok(false)` without touching the network:
    /// the silent anonymous mode used for read-only access. Otherwise
    /// fetches a CSRF token from the sign-in endpoint and posts the
    /// credentials; on success the session is marked authenticated and
    /// `Ok(true)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the sign-in endpoint rejects the
    /// credentials (message from the body's `error` field, defaulting to
    /// "Login failed").
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<bool, ClientError> {
        let mut auth = self.auth.lock().await;
        self.login_locked(&mut auth, username, password).await
    }

    /// Fetches a CSRF token from the sign-in endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingHeader`] if the response carries no
    /// `x-csrf-token` header.
    pub async fn get_csrf_token(&self) -> Result<String, ClientError> {
        let url = format!("{}/users/sign_in", self.config.endpoint());
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .send()
            .await?;

        response
            .headers()
            .get("x-csrf-token")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
            .ok_or(ClientError::MissingHeader {
                header: "x-csrf-token",
            })
    }

    /// Returns a valid bearer token, acquiring or refreshing one as needed.
    ///
    /// A token is (re)acquired when none is cached or the cached one has
    /// expired. If the session is not authenticated, a login is attempted
    /// first; in anonymous mode this returns `Ok(None)` and requests
    /// proceed unauthenticated. With a refresh token on hand the
    /// `refresh_token` grant is used, otherwise the cookie-authenticated
    /// `password` grant, both against `<endpoint>/oauth/token` with the
    /// registered client id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the token endpoint reports an
    /// error payload.
    pub async fn get_bearer_token(&self) -> Result<Option<String>, ClientError> {
        let mut auth = self.auth.lock().await;
        if !auth.needs_token() {
            return Ok(auth.bearer_token.clone());
        }

        if !auth.logged_in() && !self.login_locked(&mut auth, None, None).await? {
            return Ok(None);
        }

        let client_id = self.config.client_id().to_string();
        let form: Vec<(&str, String)> = match auth.refresh_token.clone() {
            Some(refresh_token) => {
                tracing::debug!("refreshing expired bearer token");
                vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("refresh_token", refresh_token),
                    ("client_id", client_id),
                ]
            }
            None => {
                tracing::debug!("acquiring initial bearer token");
                vec![
                    ("grant_type", "password".to_string()),
                    ("client_id", client_id),
                ]
            }
        };

        let url = format!("{}/oauth/token", self.config.endpoint());
        let body: Value = self.http.post(&url).form(&form).send().await?.json().await?;

        if let Some(errors) = body.get("errors") {
            return Err(ClientError::Api {
                message: join_error_messages(errors),
            });
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        auth.apply_token_response(token);
        Ok(auth.bearer_token.clone())
    }

    /// Login body shared by [`login`](Self::login) and the token flow,
    /// operating on already-locked auth state.
    async fn login_locked(
        &self,
        auth: &mut AuthState,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<bool, ClientError> {
        if let Some(username) = username {
            auth.username = Some(username.to_string());
        }
        if let Some(password) = password {
            auth.password = Some(password.to_string());
        }

        let (Some(username), Some(password)) = (auth.username.clone(), auth.password.clone())
        else {
            return Ok(false);
        };

        let csrf_token = self.get_csrf_token().await?;
        let login_data = json!({
            "authenticity_token": csrf_token,
            "user": {
                "login": username,
                "password": password,
                "remember_me": true,
            },
        });

        let url = format!("{}/users/sign_in", self.config.endpoint());
        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(&login_data)
            .send()
            .await?;

        if response.status().as_u16() != 200 {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Login failed")
                .to_string();
            return Err(ClientError::Api { message });
        }

        auth.logged_in = true;
        tracing::debug!(endpoint = %self.config.endpoint(), "signed in");
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) async fn auth_state(&self) -> AuthState {
        self.auth.lock().await.clone()
    }

    #[cfg(test)]
    pub(crate) async fn set_auth_state(&self, state: AuthState) {
        *self.auth.lock().await = state;
    }
}

/// Composes request headers in layers: verb-independent defaults, verb
/// defaults, then caller-supplied headers, later layers overriding earlier.
fn compose_headers(method: HttpMethod, extra: Option<&Headers>) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Accept".to_string(), API_ACCEPT.to_string());

    if matches!(method, HttpMethod::Put | HttpMethod::Post) {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
    }

    if let Some(extra) = extra {
        for (key, value) in extra {
            headers.insert(key.clone(), value.clone());
        }
    }

    headers
}

/// Joins the `message` fields of an `errors` envelope with ", ".
///
/// A missing message contributes an empty string; a non-list envelope is
/// rendered as-is.
fn join_error_messages(errors: &Value) -> String {
    errors.as_array().map_or_else(
        || errors.to_string(),
        |list| {
            list.iter()
                .map(|error| error.get("message").and_then(Value::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(", ")
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoint;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> PanoptesConfig {
        PanoptesConfig::builder()
            .endpoint(Endpoint::new(server.uri()).unwrap())
            .build()
            .unwrap()
    }

    fn authenticated_config_for(server: &MockServer) -> PanoptesConfig {
        PanoptesConfig::builder()
            .endpoint(Endpoint::new(server.uri()).unwrap())
            .username("example")
            .password("hunter2")
            .build()
            .unwrap()
    }

    async fn mock_sign_in(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/sign_in"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-csrf-token", "csrf-123"))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/sign_in"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(server)
            .await;
    }

    fn token_body(access: &str, refresh: &str) -> Value {
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 7200,
        })
    }

    #[test]
    fn test_compose_headers_get_has_accept_only() {
        let headers = compose_headers(HttpMethod::Get, None);
        assert_eq!(
            headers.get("Accept").map(String::as_str),
            Some("application/vnd.api+json; version=1")
        );
        assert!(!headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_compose_headers_put_and_post_declare_json() {
        for verb in [HttpMethod::Put, HttpMethod::Post] {
            let headers = compose_headers(verb, None);
            assert_eq!(
                headers.get("Content-Type").map(String::as_str),
                Some("application/json")
            );
        }
    }

    #[test]
    fn test_compose_headers_caller_overrides_defaults() {
        let mut extra = Headers::new();
        extra.insert("Accept".to_string(), "text/plain".to_string());
        let headers = compose_headers(HttpMethod::Get, Some(&extra));
        assert_eq!(headers.get("Accept").map(String::as_str), Some("text/plain"));
    }

    #[test]
    fn test_join_error_messages_defaults_missing_message_to_empty() {
        let errors = json!([{"message": "Conflict"}, {"code": 42}]);
        assert_eq!(join_error_messages(&errors), "Conflict, ");
    }

    #[test]
    fn test_join_error_messages_single() {
        let errors = json!([{"message": "Conflict"}]);
        assert_eq!(join_error_messages(&errors), "Conflict");
    }

    #[tokio::test]
    async fn test_connect_installs_the_active_client() {
        // The only test that touches the process-wide accessor.
        let server = MockServer::start().await;
        let installed = Panoptes::connect(config_for(&server));
        let fetched = Panoptes::client();
        assert!(Arc::ptr_eq(&installed, &fetched));
    }

    #[tokio::test]
    async fn test_anonymous_bearer_token_is_none_without_raising() {
        let server = MockServer::start().await;
        let client = Panoptes::new(config_for(&server));

        let token = client.get_bearer_token().await.unwrap();
        assert!(token.is_none());
        assert!(!client.logged_in().await);
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let response = client.get_request("/projects", None, None).await.unwrap();
        assert_eq!(response.status, 200);

        let received = &server.received_requests().await.unwrap()[0];
        assert!(!received
            .headers
            .keys()
            .any(|name| name.as_str() == "authorization"));
        let accept = received
            .headers
            .iter()
            .find(|(name, _)| name.as_str() == "accept")
            .map(|(_, values)| values.last().to_string());
        assert_eq!(accept.as_deref(), Some("application/vnd.api+json; version=1"));
    }

    #[tokio::test]
    async fn test_login_posts_csrf_token_and_marks_session() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;

        let client = Panoptes::new(authenticated_config_for(&server));
        assert!(client.login(None, None).await.unwrap());
        assert!(client.logged_in().await);

        let requests = server.received_requests().await.unwrap();
        let sign_in_post = requests
            .iter()
            .find(|r| r.method.to_string() == "POST")
            .unwrap();
        let body: Value = serde_json::from_slice(&sign_in_post.body).unwrap();
        assert_eq!(body["authenticity_token"], "csrf-123");
        assert_eq!(body["user"]["login"], "example");
        assert_eq!(body["user"]["remember_me"], true);
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/sign_in"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-csrf-token", "csrf-123"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/sign_in"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid email or password."})),
            )
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let error = client.login(None, None).await.unwrap_err();
        assert!(matches!(error, ClientError::Api { .. }));
        assert_eq!(error.to_string(), "Invalid email or password.");
    }

    #[tokio::test]
    async fn test_bearer_token_acquired_via_password_grant() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("client_id="))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("bearer-1", "refresh-1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let token = client.get_bearer_token().await.unwrap();
        assert_eq!(token.as_deref(), Some("bearer-1"));
    }

    #[tokio::test]
    async fn test_authenticated_request_carries_bearer_token() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("bearer-1", "refresh-1")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(header("Authorization", "Bearer bearer-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let (body, _) = client.get("/projects", None, None).await.unwrap();
        assert!(body.get("projects").is_some());
    }

    #[tokio::test]
    async fn test_cached_token_is_reused_until_expiry() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("bearer-1", "refresh-1")))
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let first = client.get_bearer_token().await.unwrap();
        let second = client.get_bearer_token().await.unwrap();
        assert_eq!(first, second);
        // The .expect(1) on the token mock verifies no second round trip.
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_with_refresh_grant() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("bearer-2", "refresh-2")))
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let mut state = AuthState::new(Some("example".to_string()), Some("hunter2".to_string()));
        state.logged_in = true;
        state.bearer_token = Some("bearer-1".to_string());
        state.refresh_token = Some("refresh-1".to_string());
        state.bearer_expires = Some(Utc::now() - Duration::seconds(10));
        client.set_auth_state(state).await;

        let token = client.get_bearer_token().await.unwrap();
        assert_eq!(token.as_deref(), Some("bearer-2"));

        let state = client.auth_state().await;
        assert_eq!(state.refresh_token.as_deref(), Some("refresh-2"));
        assert!(!state.bearer_expired());
    }

    #[tokio::test]
    async fn test_token_endpoint_error_payload_fails() {
        let server = MockServer::start().await;
        mock_sign_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errors": [{"message": "invalid_grant"}]})),
            )
            .mount(&server)
            .await;

        let client = Panoptes::new(authenticated_config_for(&server));
        let error = client.get_bearer_token().await.unwrap_err();
        assert_eq!(error.to_string(), "invalid_grant");
    }

    #[tokio::test]
    async fn test_server_error_raises_at_http_layer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let error = client.get_request("/projects", None, None).await.unwrap_err();
        assert!(matches!(error, ClientError::Server { status: 502 }));
    }

    #[tokio::test]
    async fn test_4xx_passes_through_http_layer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let response = client
            .get_request("/projects/404", None, None)
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_json_request_unwraps_errors_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errors": [{"message": "Conflict"}]})),
            )
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let error = client.get("/projects", None, None).await.unwrap_err();
        assert_eq!(error.to_string(), "Conflict");
    }

    #[tokio::test]
    async fn test_json_request_flags_4xx_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let error = client.get("/projects", None, None).await.unwrap_err();
        assert!(matches!(error, ClientError::Api { .. }));
        assert!(error.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_json_request_returns_etag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "W/\"etag-1\"")
                    .set_body_json(json!({"projects": [{"id": "1"}]})),
            )
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let (_, etag) = client.get("/projects/1", None, None).await.unwrap();
        assert_eq!(etag.as_deref(), Some("W/\"etag-1\""));
    }

    #[tokio::test]
    async fn test_etag_is_sent_as_if_match() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/projects/1"))
            .and(header("If-Match", "W/\"etag-1\""))
            .and(header("Content-Type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"projects": [{"id": "1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Panoptes::new(config_for(&server));
        let body = json!({"projects": {"display_name": "Updated"}});
        client
            .put("/projects/1", None, None, Some(&body), Some("W/\"etag-1\""))
            .await
            .unwrap();
    }
}
