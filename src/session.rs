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

//! Identity & Session Store (spec 4.3): issues, validates, reconnects,
//! revokes and garbage-collects IP-bound bearer session tokens.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use rand::RngCore;
use tokio::sync::Mutex;

use crate::registry::ConnId;

#[derive(Clone, Debug)]
struct SessionRecord {
	ip: IpAddr,
	conn_id: Option<ConnId>,
	is_connected: bool,
	disconnected_at: Option<Instant>,
	revoked: bool,
}

pub struct SessionStore {
	sessions: Mutex<HashMap<String, SessionRecord>>,
	by_conn: Mutex<HashMap<ConnId, String>>,
	expiry: Duration,
}

fn generate_token() -> String {
	// 256-bit, URL-safe random token (spec 3).
	let mut bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut bytes);
	base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

impl SessionStore {
	pub fn new(expiry: Duration) -> SessionStore {
		SessionStore {
			sessions: Mutex::new(HashMap::new()),
			by_conn: Mutex::new(HashMap::new()),
			expiry,
		}
	}

	pub async fn generate(&self, conn_id: ConnId, ip: IpAddr) -> String {
		let token = generate_token();
		let mut sessions = self.sessions.lock().await;
		sessions.insert(
			token.clone(),
			SessionRecord {
				ip,
				conn_id: Some(conn_id),
				is_connected: true,
				disconnected_at: None,
				revoked: false,
			},
		);
		drop(sessions);
		self.by_conn.lock().await.insert(conn_id, token.clone());
		token
	}

	/// Validates a token against the request IP. Rejects unknown, revoked,
	/// IP-mismatched, or expired-after-disconnect tokens (spec 4.3). Revoked
	/// tokens are rejected unconditionally, before any reconnect logic, so a
	/// ban cannot be bypassed by presenting a still-cached token.
	pub async fn validate(&self, token: &str, request_ip: IpAddr) -> bool {
		let sessions = self.sessions.lock().await;
		match sessions.get(token) {
			None => false,
			Some(record) => {
				if record.revoked {
					return false;
				}
				if record.ip != request_ip {
					return false;
				}
				if let Some(disconnected_at) = record.disconnected_at {
					if disconnected_at.elapsed() > self.expiry {
						return false;
					}
				}
				true
			}
		}
	}

	/// Re-binds a validated token to a new connection handle (spec 4.3).
	pub async fn reconnect(&self, token: &str, new_conn_id: ConnId) {
		let mut sessions = self.sessions.lock().await;
		if let Some(record) = sessions.get_mut(token) {
			if let Some(old_conn) = record.conn_id {
				drop(sessions);
				self.by_conn.lock().await.remove(&old_conn);
				sessions = self.sessions.lock().await;
			}
			if let Some(record) = sessions.get_mut(token) {
				record.conn_id = Some(new_conn_id);
				record.is_connected = true;
				record.disconnected_at = None;
			}
		}
		drop(sessions);
		self.by_conn.lock().await.insert(new_conn_id, token.to_string());
	}

	/// Marks every token bound to `conn_id` as disconnected, keeping the
	/// token alive for `expiry` to allow a reconnect.
	pub async fn mark_disconnected(&self, conn_id: ConnId) {
		let token = self.by_conn.lock().await.remove(&conn_id);
		if let Some(token) = token {
			let mut sessions = self.sessions.lock().await;
			if let Some(record) = sessions.get_mut(&token) {
				record.is_connected = false;
				record.disconnected_at = Some(Instant::now());
				record.conn_id = None;
			}
		}
	}

	pub async fn revoke_by_ip(&self, ip: IpAddr) {
		let mut sessions = self.sessions.lock().await;
		for record in sessions.values_mut() {
			if record.ip == ip {
				record.revoked = true;
			}
		}
	}

	pub async fn revoke_all(&self) {
		let mut sessions = self.sessions.lock().await;
		for record in sessions.values_mut() {
			record.revoked = true;
		}
	}

	/// Permanently removes tokens that are revoked or have been disconnected
	/// for more than `expiry`. Intended to run on a 60s sweep (spec 4.3).
	pub async fn sweep(&self) {
		let mut sessions = self.sessions.lock().await;
		sessions.retain(|_, record| {
			if record.revoked {
				return false;
			}
			match record.disconnected_at {
				Some(disconnected_at) => disconnected_at.elapsed() <= self.expiry,
				None => true,
			}
		});
	}

	pub async fn len(&self) -> usize {
		self.sessions.lock().await.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{IpAddr, Ipv4Addr};

	fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
		IpAddr::V4(Ipv4Addr::new(a, b, c, d))
	}

	#[tokio::test]
	async fn validates_only_from_the_issuing_ip() {
		let store = SessionStore::new(Duration::from_secs(300));
		let token = store.generate(1, ip(1, 2, 3, 4)).await;
		assert!(store.validate(&token, ip(1, 2, 3, 4)).await);
		assert!(!store.validate(&token, ip(5, 6, 7, 8)).await);
	}

	#[tokio::test]
	async fn revoke_wins_over_reconnect() {
		let store = SessionStore::new(Duration::from_secs(300));
		let token = store.generate(1, ip(1, 2, 3, 4)).await;
		store.mark_disconnected(1).await;
		store.revoke_by_ip(ip(1, 2, 3, 4)).await;
		store.reconnect(&token, 2).await;
		assert!(!store.validate(&token, ip(1, 2, 3, 4)).await);
	}

	#[tokio::test]
	async fn unknown_token_is_rejected() {
		let store = SessionStore::new(Duration::from_secs(300));
		assert!(!store.validate("not-a-real-token", ip(1, 2, 3, 4)).await);
	}

	#[tokio::test]
	async fn sweep_removes_expired_disconnected_tokens() {
		let store = SessionStore::new(Duration::from_millis(0));
		let token = store.generate(1, ip(1, 2, 3, 4)).await;
		store.mark_disconnected(1).await;
		tokio::time::sleep(Duration::from_millis(5)).await;
		store.sweep().await;
		assert_eq!(store.len().await, 0);
		assert!(!store.validate(&token, ip(1, 2, 3, 4)).await);
	}
}
