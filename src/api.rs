use std::fmt;
use std::future::Future;

use anyhow::{Context, Result};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName,
    HeaderValue, InvalidHeaderValue, ORIGIN, PRAGMA, REFERER, USER_AGENT,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::accounts::Credential;
use crate::config::ApiConfig;
use crate::types::{
    CreateOrderData, CreateOrderRequest, Envelope, GameAction, GameActionsRequest, GameState,
    LoginData, LoginRequest, OrderStatusRequest,
};
use crate::{SUCCESS_CODE, WEB_ORIGIN};

/// Fixed set of game API endpoints. All of them are POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    GameState,
    GameActions,
    CreateOrder,
    OrderStatus,
    TaskList,
    Shop,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/index/tglogin",
            Endpoint::GameState => "/zone/user/gamestate",
            Endpoint::GameActions => "/zone/user/gameactions",
            Endpoint::CreateOrder => "/zone/order/createorder",
            Endpoint::OrderStatus => "/zone/order/status",
            Endpoint::TaskList => "/zone/task/plist",
            Endpoint::Shop => "/zone/order/goodslist",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::GameState => "game_state",
            Endpoint::GameActions => "game_actions",
            Endpoint::CreateOrder => "create_order",
            Endpoint::OrderStatus => "order_status",
            Endpoint::TaskList => "task_list",
            Endpoint::Shop => "shop",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a single API call produced no usable data.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not JSON, or the payload had the wrong shape.
    #[error("invalid {endpoint} response: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a non-success `code`.
    #[error("{endpoint} rejected with code {code}{}", message_suffix(.message))]
    Rejected {
        endpoint: Endpoint,
        code: i64,
        message: Option<String>,
    },

    /// Success envelope without a `data` field.
    #[error("{endpoint} response has no data")]
    MissingData { endpoint: Endpoint },

    /// Session token cannot be sent as a header value.
    #[error("session token is not a valid header value")]
    InvalidToken(#[from] InvalidHeaderValue),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(msg) if !msg.is_empty() => format!(": {msg}"),
        _ => String::new(),
    }
}

impl ApiError {
    /// Server-side `code` for application-level rejections.
    pub fn code(&self) -> Option<i64> {
        match self {
            ApiError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Check the envelope `code` and hand back its `data`, if any.
pub fn accept_envelope(endpoint: Endpoint, envelope: Envelope) -> ApiResult<Option<Value>> {
    if envelope.code != SUCCESS_CODE {
        return Err(ApiError::Rejected {
            endpoint,
            code: envelope.code,
            message: envelope.msg,
        });
    }
    Ok(envelope.data.filter(|data| !data.is_null()))
}

/// Decode a raw response body into a typed `data` payload.
pub fn decode_body<T: DeserializeOwned>(endpoint: Endpoint, body: &[u8]) -> ApiResult<T> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|source| ApiError::Decode { endpoint, source })?;
    let data = accept_envelope(endpoint, envelope)?.ok_or(ApiError::MissingData { endpoint })?;
    serde_json::from_value(data).map_err(|source| ApiError::Decode { endpoint, source })
}

/// Decode a raw response body whose `data` is optional; absent data becomes `null`.
pub fn decode_body_lenient(endpoint: Endpoint, body: &[u8]) -> ApiResult<Value> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|source| ApiError::Decode { endpoint, source })?;
    Ok(accept_envelope(endpoint, envelope)?.unwrap_or(Value::Null))
}

/// Operations the poller, bootstrap and order flows need from the game server.
pub trait GameApi {
    /// Exchange an init-data query string for a session token.
    fn login(&self, credential: &Credential) -> impl Future<Output = ApiResult<String>> + Send;

    fn game_state(&self, token: &str) -> impl Future<Output = ApiResult<GameState>> + Send;

    fn game_action(
        &self,
        token: &str,
        action: GameAction,
    ) -> impl Future<Output = ApiResult<Value>> + Send;

    /// Create a purchase order, returning its order number.
    fn create_order(
        &self,
        token: &str,
        goods_id: u64,
    ) -> impl Future<Output = ApiResult<String>> + Send;

    fn order_status(
        &self,
        token: &str,
        order_no: &str,
    ) -> impl Future<Output = ApiResult<Value>> + Send;
}

/// HTTP client for the game API.
///
/// Headers are rebuilt for every request from an immutable browser template,
/// so concurrent requests never see each other's authorization token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    base_headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("invalid API base URL {}", config.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must be http(s), got {}", config.base_url);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            base_headers: browser_headers()?,
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Fresh header set for one request: template + content type + optional token.
    pub fn request_headers(&self, token: Option<&str>) -> ApiResult<HeaderMap> {
        let mut headers = self.base_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn post_raw<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ApiResult<Vec<u8>> {
        let headers = self.request_headers(token)?;
        let mut req = self.http.post(self.url(endpoint)).headers(headers);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        debug!("POST {endpoint} -> {status} ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let bytes = self.post_raw(endpoint, token, body).await?;
        decode_body(endpoint, &bytes)
    }

    async fn post_lenient<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ApiResult<Value> {
        let bytes = self.post_raw(endpoint, token, body).await?;
        decode_body_lenient(endpoint, &bytes)
    }

    /// Goods available in the shop.
    pub async fn goods_list(&self, token: &str) -> ApiResult<Value> {
        self.post_lenient::<()>(Endpoint::Shop, Some(token), None).await
    }

    /// Task list for the account.
    pub async fn task_list(&self, token: &str) -> ApiResult<Value> {
        self.post_lenient::<()>(Endpoint::TaskList, Some(token), None).await
    }
}

impl GameApi for ApiClient {
    async fn login(&self, credential: &Credential) -> ApiResult<String> {
        let body = LoginRequest {
            init_data: credential.query(),
        };
        let data: LoginData = self.post(Endpoint::Login, None, Some(&body)).await?;
        Ok(data.login_token)
    }

    async fn game_state(&self, token: &str) -> ApiResult<GameState> {
        self.post::<_, ()>(Endpoint::GameState, Some(token), None).await
    }

    async fn game_action(&self, token: &str, action: GameAction) -> ApiResult<Value> {
        let body = GameActionsRequest {
            actions: vec![action],
        };
        self.post_lenient(Endpoint::GameActions, Some(token), Some(&body))
            .await
    }

    async fn create_order(&self, token: &str, goods_id: u64) -> ApiResult<String> {
        let body = CreateOrderRequest { goods_id };
        let data: CreateOrderData = self
            .post(Endpoint::CreateOrder, Some(token), Some(&body))
            .await?;
        Ok(data.info.order_no)
    }

    async fn order_status(&self, token: &str, order_no: &str) -> ApiResult<Value> {
        let body = OrderStatusRequest { order_no };
        self.post_lenient(Endpoint::OrderStatus, Some(token), Some(&body))
            .await
    }
}

/// Header template mimicking the mobile web client.
fn browser_headers() -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));
    headers.insert(
        REFERER,
        HeaderValue::from_str(&format!("{WEB_ORIGIN}/")).context("invalid referer")?,
    );
    headers.insert(
        HeaderName::from_static("priority"),
        HeaderValue::from_static("u=1, i"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(crate::USER_AGENT));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::new(&ApiConfig::default()).unwrap()
    }

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    // ── request building ───────────────────────────────────────────

    #[test]
    fn urls_use_base() {
        let c = client();
        assert_eq!(
            c.url(Endpoint::Login),
            "https://fishapi.xboost.io/index/tglogin"
        );
        assert_eq!(
            c.url(Endpoint::GameState),
            "https://fishapi.xboost.io/zone/user/gamestate"
        );
    }

    #[test]
    fn trailing_slash_in_base_is_dropped() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9000/".to_string(),
            request_timeout_secs: Some(5),
        };
        let c = ApiClient::new(&config).unwrap();
        assert_eq!(c.url(Endpoint::Shop), "http://127.0.0.1:9000/zone/order/goodslist");
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            request_timeout_secs: None,
        };
        assert!(ApiClient::new(&config).is_err());

        let config = ApiConfig {
            base_url: "ftp://fishapi.xboost.io".to_string(),
            request_timeout_secs: None,
        };
        assert!(ApiClient::new(&config).is_err());
    }

    #[test]
    fn headers_without_token() {
        let headers = client().request_headers(None).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ORIGIN], WEB_ORIGIN);
        assert_eq!(headers[REFERER], "https://happy-aquarium.xboost.io/");
        assert_eq!(headers["sec-fetch-site"], "same-site");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn headers_are_independent_per_request() {
        let c = client();
        let first = c.request_headers(Some("T1")).unwrap();
        let second = c.request_headers(Some("T2")).unwrap();
        let third = c.request_headers(None).unwrap();
        assert_eq!(first[AUTHORIZATION], "T1");
        assert_eq!(second[AUTHORIZATION], "T2");
        assert!(third.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = client().request_headers(Some("bad\ntoken")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken(_)));
    }

    // ── response decoding ──────────────────────────────────────────

    #[test]
    fn decode_login_success() {
        let data: LoginData = decode_body(
            Endpoint::Login,
            &body(json!({"code": 200, "data": {"login_token": "T1"}})),
        )
        .unwrap();
        assert_eq!(data.login_token, "T1");
    }

    #[test]
    fn decode_rejection_keeps_code_and_message() {
        let err = decode_body::<LoginData>(
            Endpoint::Login,
            &body(json!({"code": 401, "msg": "expired"})),
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(401));
        assert_eq!(err.to_string(), "login rejected with code 401: expired");
    }

    #[test]
    fn decode_rejection_without_message() {
        let err = decode_body::<GameState>(Endpoint::GameState, &body(json!({"code": 500})))
            .unwrap_err();
        assert_eq!(err.to_string(), "game_state rejected with code 500");
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[test]
    fn decode_non_json_body() {
        let err = decode_body::<GameState>(Endpoint::GameState, b"<html>502</html>").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Decode {
                endpoint: Endpoint::GameState,
                ..
            }
        ));
    }

    #[test]
    fn decode_missing_data() {
        let err = decode_body::<GameState>(
            Endpoint::GameState,
            &body(json!({"code": 200, "data": null})),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingData { .. }));
    }

    #[test]
    fn decode_wrong_shape() {
        let err = decode_body::<GameState>(
            Endpoint::GameState,
            &body(json!({"code": 200, "data": {"gold": "lots"}})),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn lenient_decode_allows_missing_data() {
        let value =
            decode_body_lenient(Endpoint::GameActions, &body(json!({"code": 200}))).unwrap();
        assert!(value.is_null());

        let err = decode_body_lenient(Endpoint::GameActions, &body(json!({"code": 403})))
            .unwrap_err();
        assert_eq!(err.code(), Some(403));
    }
}
