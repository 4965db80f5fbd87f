//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use learnhub_realtime::connection::{
    AuthenticatedConnection, HeartbeatConfig, Registration, WsAuthenticator, run_heartbeat,
};

use crate::error::ApiResult;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    #[serde(default)]
    pub token: String,
}

/// GET /ws?token={jwt}
///
/// The token is verified before the upgrade so that a bad token gets a
/// plain 401 instead of an opened-then-closed socket.
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> ApiResult<Response> {
    let authenticator = WsAuthenticator::new(state.jwt_decoder.clone());
    let auth = authenticator.authenticate(&query.token)?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, auth, socket)))
}

/// Drives one established connection until either side closes it.
async fn handle_ws_connection(state: AppState, auth: AuthenticatedConnection, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Registration {
        handle,
        mut receiver,
        ..
    } = state.gateway.connect(&auth).await;
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "WebSocket connection established"
    );

    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig::from(state.realtime.connections.config()),
    ));

    loop {
        tokio::select! {
            // Evicted, timed out, or shut down.
            _ = handle.closed() => break,
            next = ws_rx.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    state.gateway.handle_inbound(&conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Pong(_))) => handle.record_pong().await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    heartbeat_task.abort();
    state.gateway.disconnect(&conn_id).await;
    handle.mark_closed();
    outbound_task.abort();

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "WebSocket connection closed"
    );
}
