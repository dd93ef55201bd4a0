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

//! Hashrate Aggregator (spec 4.7): periodically garbage-collects stale
//! per-connection hashrate samples, keeps a bounded chart history, and
//! broadcasts the network total. The lazy-eviction-of-stale-entries shape
//! is the same one the teacher's `grin_util::rate_counter::RateCounter`
//! uses for its own rolling window.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::registry::ConnectionRegistry;
use crate::ws::ServerMessage;

const CHART_HISTORY_CAPACITY: usize = 50;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HashratePoint {
	pub total_hashrate: f64,
	pub active_miners: u32,
	pub timestamp: i64,
}

/// Bounded ring buffer of recent `(total_hashrate, active_miners)` points,
/// exposed read-only through the Control Plane for charting.
#[derive(Default)]
pub struct HashrateHistory {
	points: Mutex<VecDeque<HashratePoint>>,
}

impl HashrateHistory {
	fn new() -> HashrateHistory {
		HashrateHistory {
			points: Mutex::new(VecDeque::with_capacity(CHART_HISTORY_CAPACITY)),
		}
	}

	async fn push(&self, point: HashratePoint) {
		let mut points = self.points.lock().await;
		if points.len() == CHART_HISTORY_CAPACITY {
			points.pop_front();
		}
		points.push_back(point);
	}

	pub async fn snapshot(&self) -> Vec<HashratePoint> {
		self.points.lock().await.iter().copied().collect()
	}
}

pub async fn run(
	registry: Arc<ConnectionRegistry>,
	history: Arc<HashrateHistory>,
	sample_ttl: Duration,
	tick: Duration,
) {
	let mut interval = tokio::time::interval(tick);
	loop {
		interval.tick().await;
		let (total_hashrate, active_miners) = registry.gc_and_summarize_hashrate(sample_ttl).await;
		let timestamp = Utc::now().timestamp();

		history
			.push(HashratePoint {
				total_hashrate,
				active_miners,
				timestamp,
			})
			.await;

		registry
			.broadcast(&ServerMessage::NetworkHashrate {
				total_hashrate,
				active_miners,
				timestamp,
			})
			.await;
	}
}

pub fn new_history() -> Arc<HashrateHistory> {
	Arc::new(HashrateHistory::new())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn history_drops_oldest_past_capacity() {
		let history = HashrateHistory::new();
		for i in 0..(CHART_HISTORY_CAPACITY + 10) {
			history
				.push(HashratePoint {
					total_hashrate: i as f64,
					active_miners: 1,
					timestamp: i as i64,
				})
				.await;
		}
		let snapshot = history.snapshot().await;
		assert_eq!(snapshot.len(), CHART_HISTORY_CAPACITY);
		assert_eq!(snapshot.front().unwrap().timestamp, 10);
	}
}
