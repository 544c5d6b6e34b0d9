//! WebSocket Handler
//!
//! 推送章节顺序变化，客户端据此刷新目录

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

/// 单个故事的 WebSocket（只推该故事的事件）
pub async fn story_websocket_handler(
    ws: WebSocketUpgrade,
    Path(story_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let event_rx = state.event_publisher.subscribe_story(story_id);
    ws.on_upgrade(move |socket| async move {
        tracing::info!(story_id = %story_id, "Story WebSocket connected");
        forward_events(socket, event_rx).await;
        tracing::info!(story_id = %story_id, "Story WebSocket disconnected");
    })
}

/// 全局 WebSocket（全部故事的事件）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let event_rx = state.event_publisher.subscribe_global();
    ws.on_upgrade(move |socket| async move {
        tracing::info!("Global WebSocket connected");
        forward_events(socket, event_rx).await;
        tracing::info!("Global WebSocket disconnected");
    })
}

async fn forward_events(socket: WebSocket, mut event_rx: broadcast::Receiver<WsEvent>) {
    let (mut sender, mut receiver) = socket.split();

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket subscriber lagged, events dropped");
                    continue;
                }
                // 通道关闭（故事已删除）
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
        let _ = sender.close().await;
    });

    // 接收客户端消息（心跳）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!("WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket error");
                    break;
                }
                // Ping 由 axum 自动回复
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }
}
