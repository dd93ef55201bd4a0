// Copyright 2026 The HashPass Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `GET /api/ws?token=...` (spec 6): the WebSocket entry point. Wires the
//! Admission Pipeline (spec 4.4) to the Connection Registry, Session
//! Store, and Puzzle Engine's mining-timer hooks, then runs the message
//! loop for the life of the socket.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{ConnectInfo, Query, State, WebSocketUpgrade};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};

use crate::admission::{self, ConnectMode};
use crate::state::AppState;
use crate::ws::{parse_client_message, ClientMessage, ServerMessage};

pub async fn ws_handler(
	ws: WebSocketUpgrade,
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Query(params): Query<HashMap<String, String>>,
) -> Response {
	let ip = addr.ip();
	let ua = headers
		.get(USER_AGENT)
		.and_then(|v| v.to_str().ok())
		.map(|s| s.to_string());
	let token = params.get("token").cloned().unwrap_or_default();

	ws.on_upgrade(move |socket| handle_socket(socket, state, ip, ua, token))
}

async fn handle_socket(socket: WebSocket, state: AppState, ip: std::net::IpAddr, ua: Option<String>, token: String) {
	let (mut sink, mut stream) = socket.split();
	let mode = admission::classify(&token, ip, &state.sessions).await;

	let conn_id = match mode {
		ConnectMode::FirstConnect => {
			if let Err(e) = admission::screen_first_connect(
				ua.as_deref(),
				ip,
				&token,
				&state.bans,
				&state.registry,
				&state.captcha,
			)
			.await
			{
				close_with(&mut sink, e.ws_close()).await;
				return;
			}
			let (id, _evicted) = state.registry.register(ip, sink).await;
			let session_token = state.sessions.generate(id, ip).await;
			let _ = state
				.registry
				.send_to(id, &ServerMessage::SessionToken { token: session_token })
				.await;
			id
		}
		ConnectMode::Reconnect => {
			if let Err(e) = admission::screen_reconnect(&token, ip, &state.sessions).await {
				close_with(&mut sink, e.ws_close()).await;
				return;
			}
			// Evict any existing connection from the same IP (spec 4.4.2).
			state.registry.close_ip(ip, 1000, "Replaced by new connection").await;
			let (id, _evicted) = state.registry.register(ip, sink).await;
			state.sessions.reconnect(&token, id).await;
			id
		}
	};

	while let Some(frame) = stream.next().await {
		let Ok(message) = frame else { break };
		match message {
			Message::Text(text) => handle_client_message(&state, conn_id, &text).await,
			Message::Close(_) => break,
			_ => {}
		}
	}

	state.engine.mining_stop(conn_id).await;
	state.sessions.mark_disconnected(conn_id).await;
	state.registry.remove(conn_id).await;
}

async fn handle_client_message(state: &AppState, conn_id: crate::registry::ConnId, text: &str) {
	let Some(message) = parse_client_message(text) else { return };
	match message {
		ClientMessage::Ping => {
			let _ = state
				.registry
				.send_to(conn_id, &ServerMessage::Pong { online: true })
				.await;
		}
		ClientMessage::MiningStart => state.engine.mining_start(conn_id).await,
		ClientMessage::MiningStop => state.engine.mining_stop(conn_id).await,
		ClientMessage::Hashrate { payload } => {
			state
				.registry
				.report_hashrate(conn_id, payload.rate, state.engine.max_nonce_speed())
				.await;
		}
	}
}

async fn close_with(
	sink: &mut futures::stream::SplitSink<WebSocket, Message>,
	(code, reason): (u16, String),
) {
	let _ = sink
		.send(Message::Close(Some(CloseFrame {
			code,
			reason: reason.into(),
		})))
		.await;
}
