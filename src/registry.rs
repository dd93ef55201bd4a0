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

//! Connection Registry (spec section 2 component 4, spec 4.5, spec 4.8).
//!
//! Tracks accepted WebSocket connections, one per IP, their reported
//! hashrate, and implements the broadcast mechanism: snapshot the active
//! connections, dispatch concurrently, prune anything that fails to send.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;

use crate::ws::ServerMessage;

pub type ConnId = u64;

#[derive(Clone, Copy, Debug)]
pub struct HashrateSample {
	pub rate: f64,
	pub recorded_at: Instant,
}

struct Connection {
	ip: IpAddr,
	connected_at: Instant,
	sink: Arc<Mutex<SplitSink<WebSocket, Message>>>,
}

#[derive(Default)]
struct RegistryState {
	connections: HashMap<ConnId, Connection>,
	by_ip: HashMap<IpAddr, ConnId>,
	hashrate_samples: HashMap<ConnId, HashrateSample>,
	overspeed_samples: HashMap<ConnId, HashrateSample>,
}

pub struct ConnectionRegistry {
	state: Mutex<RegistryState>,
	next_id: AtomicU64,
}

impl Default for ConnectionRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ConnectionRegistry {
	pub fn new() -> ConnectionRegistry {
		ConnectionRegistry {
			state: Mutex::new(RegistryState::default()),
			next_id: AtomicU64::new(1),
		}
	}

	/// Registers a newly accepted socket for `ip`. If a connection already
	/// exists for that IP it is evicted and its id returned alongside the
	/// new id, so the caller can close the old socket with the appropriate
	/// reason (spec 4.4: duplicate rejection on first-connect, eviction on
	/// reconnect).
	pub async fn register(
		&self,
		ip: IpAddr,
		sink: SplitSink<WebSocket, Message>,
	) -> (ConnId, Option<ConnId>) {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut state = self.state.lock().await;
		let evicted = state.by_ip.insert(ip, id);
		if let Some(old_id) = evicted {
			state.connections.remove(&old_id);
			state.hashrate_samples.remove(&old_id);
			state.overspeed_samples.remove(&old_id);
		}
		state.connections.insert(
			id,
			Connection {
				ip,
				connected_at: Instant::now(),
				sink: Arc::new(Mutex::new(sink)),
			},
		);
		(id, evicted)
	}

	pub async fn remove(&self, id: ConnId) {
		let mut state = self.state.lock().await;
		if let Some(conn) = state.connections.remove(&id) {
			if state.by_ip.get(&conn.ip) == Some(&id) {
				state.by_ip.remove(&conn.ip);
			}
		}
		state.hashrate_samples.remove(&id);
		state.overspeed_samples.remove(&id);
	}

	pub async fn has_connection(&self, ip: IpAddr) -> bool {
		self.state.lock().await.by_ip.contains_key(&ip)
	}

	pub async fn connection_count(&self) -> usize {
		self.state.lock().await.connections.len()
	}

	/// Sends a single message directly to one connection (used for the
	/// first-connect `SESSION_TOKEN` message and for `PONG`).
	pub async fn send_to(&self, id: ConnId, message: &ServerMessage) -> Result<(), ()> {
		let sink = {
			let state = self.state.lock().await;
			state.connections.get(&id).map(|c| c.sink.clone())
		};
		let Some(sink) = sink else {
			return Err(());
		};
		let text = serde_json::to_string(message).map_err(|_| ())?;
		sink.lock().await.send(Message::Text(text)).await.map_err(|_| ())
	}

	/// Closes one connection with the given close code and reason (spec 6
	/// close codes; used by reconnect eviction and admin kicks).
	pub async fn close(&self, id: ConnId, code: u16, reason: &'static str) {
		let sink = {
			let state = self.state.lock().await;
			state.connections.get(&id).map(|c| c.sink.clone())
		};
		if let Some(sink) = sink {
			let frame = axum::extract::ws::CloseFrame {
				code,
				reason: reason.into(),
			};
			let _ = sink.lock().await.send(Message::Close(Some(frame))).await;
		}
		self.remove(id).await;
	}

	pub async fn close_ip(&self, ip: IpAddr, code: u16, reason: &'static str) {
		let id = self.state.lock().await.by_ip.get(&ip).copied();
		if let Some(id) = id {
			self.close(id, code, reason).await;
		}
	}

	pub async fn close_all(&self, code: u16, reason: &'static str) {
		let ids: Vec<ConnId> = self.state.lock().await.connections.keys().copied().collect();
		for id in ids {
			self.close(id, code, reason).await;
		}
	}

	/// Broadcasts a message to every connected socket (spec 4.8): snapshot,
	/// dispatch concurrently, prune failures.
	pub async fn broadcast(&self, message: &ServerMessage) {
		let text = match serde_json::to_string(message) {
			Ok(t) => t,
			Err(_) => return,
		};
		let snapshot: Vec<(ConnId, Arc<Mutex<SplitSink<WebSocket, Message>>>)> = {
			let state = self.state.lock().await;
			state
				.connections
				.iter()
				.map(|(id, conn)| (*id, conn.sink.clone()))
				.collect()
		};

		let sends = snapshot.into_iter().map(|(id, sink)| {
			let text = text.clone();
			async move {
				let result = sink.lock().await.send(Message::Text(text)).await;
				(id, result.is_ok())
			}
		});
		let results = futures::future::join_all(sends).await;

		let failed: Vec<ConnId> = results
			.into_iter()
			.filter_map(|(id, ok)| if ok { None } else { Some(id) })
			.collect();
		for id in failed {
			self.remove(id).await;
		}
	}

	/// Records a reported hashrate sample (spec 4.5): accepted only if
	/// numeric and in `[0, 1000)`. Samples above `max_nonce_speed` (when
	/// configured) are routed to the overspeed map instead of the normal
	/// one, so they never contribute to the broadcast network hashrate.
	pub async fn report_hashrate(&self, id: ConnId, rate: f64, max_nonce_speed: f64) {
		if !(0.0..1000.0).contains(&rate) || rate.is_nan() {
			return;
		}
		let sample = HashrateSample {
			rate,
			recorded_at: Instant::now(),
		};
		let mut state = self.state.lock().await;
		if !state.connections.contains_key(&id) {
			return;
		}
		if max_nonce_speed > 0.0 && rate > max_nonce_speed {
			state.overspeed_samples.insert(id, sample);
		} else {
			state.hashrate_samples.insert(id, sample);
		}
	}

	/// Discards samples older than `ttl` and returns `(total_hashrate,
	/// active_miners)` over what remains (spec 4.7).
	pub async fn gc_and_summarize_hashrate(&self, ttl: Duration) -> (f64, u32) {
		let mut state = self.state.lock().await;
		let now = Instant::now();
		state
			.hashrate_samples
			.retain(|_, sample| now.duration_since(sample.recorded_at) <= ttl);
		state
			.overspeed_samples
			.retain(|_, sample| now.duration_since(sample.recorded_at) <= ttl);
		let total: f64 = state.hashrate_samples.values().map(|s| s.rate).sum();
		let active = state.hashrate_samples.len() as u32;
		(total, active)
	}

	pub async fn connected_at(&self, id: ConnId) -> Option<Instant> {
		self.state.lock().await.connections.get(&id).map(|c| c.connected_at)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn hashrate_sample_rejects_out_of_range() {
		let registry = ConnectionRegistry::new();
		// No connection registered; report_hashrate is a no-op but must not
		// panic on an unknown id.
		registry.report_hashrate(999, 1500.0, 0.0).await;
		let (total, active) = registry.gc_and_summarize_hashrate(Duration::from_secs(10)).await;
		assert_eq!(total, 0.0);
		assert_eq!(active, 0);
	}
}
