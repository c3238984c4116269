//! Game mutations and the shop order flow.
//!
//! None of these run as part of the polling loop; they are driven on demand
//! by the `aquarium-action` binary.

use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiResult, GameApi};
use crate::session::Session;
use crate::types::{ActionKind, GameAction};

/// Apply one action to one fish.
pub async fn perform_action<A: GameApi>(
    api: &A,
    session: &Session,
    kind: ActionKind,
    fish_id: u64,
) -> ApiResult<Value> {
    let action = GameAction { action: kind, id: fish_id };
    match api.game_action(&session.token, action).await {
        Ok(resp) => {
            info!(
                "Account {}: {kind:?} fish {fish_id} done",
                session.account()
            );
            Ok(resp)
        }
        Err(e) => {
            warn!(
                "Game action {kind:?} on fish {fish_id} failed for account {}: {e}",
                session.account()
            );
            Err(e)
        }
    }
}

/// Create an order for `goods_id` and return its status.
///
/// The status check only happens when the order was created.
pub async fn place_order<A: GameApi>(
    api: &A,
    session: &Session,
    goods_id: u64,
) -> ApiResult<Value> {
    let order_no = match api.create_order(&session.token, goods_id).await {
        Ok(order_no) => order_no,
        Err(e) => {
            warn!(
                "Order for goods {goods_id} failed for account {}: {e}",
                session.account()
            );
            return Err(e);
        }
    };
    info!(
        "Account {}: created order {order_no} for goods {goods_id}",
        session.account()
    );

    match api.order_status(&session.token, &order_no).await {
        Ok(status) => Ok(status),
        Err(e) => {
            warn!(
                "Order {order_no} status check failed for account {}: {e}",
                session.account()
            );
            Err(e)
        }
    }
}
