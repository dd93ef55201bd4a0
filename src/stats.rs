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

//! Submission accounting, modeled on the teacher's
//! `grin_servers::common::stats::WorkerStats`: one accepted/rejected/stale
//! counter set per submitting IP, not a single global tally, so
//! `GET /api/admin/stats` can show which IP is submitting garbage
//! (spec 10.5 supplement).

use std::collections::HashMap;
use std::net::IpAddr;

use tokio::sync::Mutex;

#[derive(Default)]
struct Counters {
	accepted: u64,
	rejected: u64,
	stale: u64,
}

pub struct SubmissionStats {
	by_ip: Mutex<HashMap<IpAddr, Counters>>,
}

#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct SubmissionStatsEntry {
	pub ip: IpAddr,
	pub accepted: u64,
	pub rejected: u64,
	pub stale: u64,
}

impl Default for SubmissionStats {
	fn default() -> SubmissionStats {
		SubmissionStats {
			by_ip: Mutex::new(HashMap::new()),
		}
	}
}

impl SubmissionStats {
	pub async fn record_accepted(&self, ip: IpAddr) {
		self.by_ip.lock().await.entry(ip).or_default().accepted += 1;
	}

	pub async fn record_rejected(&self, ip: IpAddr) {
		self.by_ip.lock().await.entry(ip).or_default().rejected += 1;
	}

	pub async fn record_stale(&self, ip: IpAddr) {
		self.by_ip.lock().await.entry(ip).or_default().stale += 1;
	}

	/// Snapshot of every IP seen so far, in no particular order.
	pub async fn snapshot(&self) -> Vec<SubmissionStatsEntry> {
		self.by_ip
			.lock()
			.await
			.iter()
			.map(|(ip, counters)| SubmissionStatsEntry {
				ip: *ip,
				accepted: counters.accepted,
				rejected: counters.rejected,
				stale: counters.stale,
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	fn ip(octet: u8) -> IpAddr {
		IpAddr::V4(Ipv4Addr::new(1, 2, 3, octet))
	}

	#[tokio::test]
	async fn tracks_counters_per_ip_independently() {
		let stats = SubmissionStats::default();
		stats.record_accepted(ip(1)).await;
		stats.record_rejected(ip(1)).await;
		stats.record_stale(ip(2)).await;

		let snapshot = stats.snapshot().await;
		assert_eq!(snapshot.len(), 2);

		let a = snapshot.iter().find(|e| e.ip == ip(1)).unwrap();
		assert_eq!(a.accepted, 1);
		assert_eq!(a.rejected, 1);
		assert_eq!(a.stale, 0);

		let b = snapshot.iter().find(|e| e.ip == ip(2)).unwrap();
		assert_eq!(b.accepted, 0);
		assert_eq!(b.rejected, 0);
		assert_eq!(b.stale, 1);
	}

	#[tokio::test]
	async fn an_unseen_ip_has_no_entry() {
		let stats = SubmissionStats::default();
		assert!(stats.snapshot().await.is_empty());
	}
}
