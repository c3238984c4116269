use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Response wrapper shared by every endpoint: `{code, data, msg}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, alias = "message")]
    pub msg: Option<String>,
}

// ── Request bodies ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "initData")]
    pub init_data: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GameActionsRequest {
    pub actions: Vec<GameAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameAction {
    pub action: ActionKind,
    pub id: u64,
}

/// Mutation applied to a single fish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Remove the fish from the tank.
    Delete,
    /// Merge the fish with its pair.
    Combine,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    pub goods_id: u64,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusRequest<'a> {
    pub order_no: &'a str,
}

// ── Response payloads ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub login_token: String,
}

/// Snapshot of one account's tank.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Kept as the server's number so large balances print exactly.
    pub gold: Number,
    pub level: u32,
    pub fish_limit: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fishes: Vec<Value>,
}

impl GameState {
    pub fn fish_count(&self) -> usize {
        self.fishes.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderData {
    pub info: OrderInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub order_no: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Order numbers come back as either JSON strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
