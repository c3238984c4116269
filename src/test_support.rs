//! Scripted in-memory `GameApi` used by the unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::Barrier;
use tracing::subscriber::DefaultGuard;

use crate::accounts::Credential;
use crate::api::{ApiResult, Endpoint, GameApi, decode_body, decode_body_lenient};
use crate::session::Session;
use crate::types::{CreateOrderData, GameAction, GameState, LoginData};

/// Replies with canned response envelopes and records every call.
#[derive(Default)]
pub struct ScriptedApi {
    /// query string -> login envelope
    pub logins: HashMap<String, Value>,
    /// token -> game state envelope
    pub states: HashMap<String, Value>,
    pub action_reply: Option<Value>,
    pub create_order_reply: Option<Value>,
    pub order_status_reply: Option<Value>,
    /// When set, every game state request waits here before answering.
    pub state_barrier: Option<Arc<Barrier>>,
    pub calls: Mutex<Vec<(Endpoint, String)>>,
}

impl ScriptedApi {
    pub fn with_login(mut self, query: &str, reply: Value) -> Self {
        self.logins.insert(query.to_string(), reply);
        self
    }

    pub fn with_state(mut self, token: &str, reply: Value) -> Self {
        self.states.insert(token.to_string(), reply);
        self
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    fn record(&self, endpoint: Endpoint, arg: &str) {
        self.calls.lock().unwrap().push((endpoint, arg.to_string()));
    }
}

fn reply_bytes(reply: Option<&Value>) -> Vec<u8> {
    let fallback = serde_json::json!({"code": 404, "msg": "not scripted"});
    serde_json::to_vec(reply.unwrap_or(&fallback)).unwrap()
}

impl GameApi for ScriptedApi {
    async fn login(&self, credential: &Credential) -> ApiResult<String> {
        self.record(Endpoint::Login, credential.query());
        let bytes = reply_bytes(self.logins.get(credential.query()));
        let data: LoginData = decode_body(Endpoint::Login, &bytes)?;
        Ok(data.login_token)
    }

    async fn game_state(&self, token: &str) -> ApiResult<GameState> {
        self.record(Endpoint::GameState, token);
        if let Some(barrier) = self.state_barrier.clone() {
            barrier.wait().await;
        }
        decode_body(Endpoint::GameState, &reply_bytes(self.states.get(token)))
    }

    async fn game_action(&self, token: &str, action: GameAction) -> ApiResult<Value> {
        self.record(Endpoint::GameActions, &format!("{token}:{}", action.id));
        decode_body_lenient(
            Endpoint::GameActions,
            &reply_bytes(self.action_reply.as_ref()),
        )
    }

    async fn create_order(&self, token: &str, goods_id: u64) -> ApiResult<String> {
        self.record(Endpoint::CreateOrder, &format!("{token}:{goods_id}"));
        let data: CreateOrderData = decode_body(
            Endpoint::CreateOrder,
            &reply_bytes(self.create_order_reply.as_ref()),
        )?;
        Ok(data.info.order_no)
    }

    async fn order_status(&self, token: &str, order_no: &str) -> ApiResult<Value> {
        self.record(Endpoint::OrderStatus, &format!("{token}:{order_no}"));
        decode_body_lenient(
            Endpoint::OrderStatus,
            &reply_bytes(self.order_status_reply.as_ref()),
        )
    }
}

pub fn session(account: usize, token: &str) -> Session {
    Session {
        credential: Credential::new(account, format!("query-{account}")),
        token: token.to_string(),
    }
}

/// Log output captured from a thread-local fmt subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's tracing events into the buffer until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains("WARN"))
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
