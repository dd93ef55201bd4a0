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

//! WebSocket wire messages (spec 6).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
	#[serde(rename = "SESSION_TOKEN")]
	SessionToken { token: String },
	#[serde(rename = "PUZZLE_RESET")]
	PuzzleReset {
		seed: String,
		difficulty: u32,
		solve_time: f64,
		average_solve_time: Option<f64>,
		puzzle_start_time: i64,
	},
	#[serde(rename = "NETWORK_HASHRATE")]
	NetworkHashrate {
		total_hashrate: f64,
		active_miners: u32,
		timestamp: i64,
	},
	#[serde(rename = "PONG")]
	Pong { online: bool },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	Ping,
	MiningStart,
	MiningStop,
	Hashrate { payload: HashratePayload },
}

#[derive(Clone, Debug, Deserialize)]
pub struct HashratePayload {
	pub rate: f64,
}

/// Parses a client text frame. A bare `"ping"` string is accepted alongside
/// the tagged `{"type": "ping"}` form (spec 6).
pub fn parse_client_message(text: &str) -> Option<ClientMessage> {
	if text.trim() == "\"ping\"" || text.trim() == "ping" {
		return Some(ClientMessage::Ping);
	}
	serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_bare_ping() {
		assert!(matches!(parse_client_message("ping"), Some(ClientMessage::Ping)));
	}

	#[test]
	fn parses_tagged_messages() {
		assert!(matches!(
			parse_client_message(r#"{"type":"mining_start"}"#),
			Some(ClientMessage::MiningStart)
		));
		assert!(matches!(
			parse_client_message(r#"{"type":"mining_stop"}"#),
			Some(ClientMessage::MiningStop)
		));
		match parse_client_message(r#"{"type":"hashrate","payload":{"rate":12.5}}"#) {
			Some(ClientMessage::Hashrate { payload }) => assert_eq!(payload.rate, 12.5),
			_ => panic!("expected hashrate message"),
		}
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_client_message("not json").is_none());
	}
}
