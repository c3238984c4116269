pub mod accounts;
pub mod actions;
pub mod api;
pub mod config;
pub mod poller;
pub mod reporter;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

/// Happy Aquarium game API base URL
pub const API_BASE: &str = "https://fishapi.xboost.io";

/// Origin of the web client; sent as `origin` and `referer`
pub const WEB_ORIGIN: &str = "https://happy-aquarium.xboost.io";

/// Mobile Safari user agent the web client is served to
pub const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

/// `code` value the API uses for a successful response
pub const SUCCESS_CODE: i64 = 200;
