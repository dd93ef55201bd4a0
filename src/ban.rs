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

//! Ban Set (spec 3): mutated only by the Control Plane, optionally
//! persisted to a JSON file on disk.

use std::collections::HashSet;
use std::net::IpAddr;

use tokio::sync::RwLock;

pub struct BanSet {
	ips: RwLock<HashSet<IpAddr>>,
	path: Option<String>,
}

impl BanSet {
	pub fn new(path: Option<String>) -> BanSet {
		let ips = path
			.as_ref()
			.and_then(|p| std::fs::read_to_string(p).ok())
			.and_then(|contents| serde_json::from_str::<Vec<IpAddr>>(&contents).ok())
			.map(|v| v.into_iter().collect())
			.unwrap_or_default();
		BanSet {
			ips: RwLock::new(ips),
			path,
		}
	}

	pub async fn is_banned(&self, ip: IpAddr) -> bool {
		self.ips.read().await.contains(&ip)
	}

	pub async fn ban(&self, ip: IpAddr) {
		self.ips.write().await.insert(ip);
		self.persist().await;
	}

	pub async fn unban(&self, ip: IpAddr) {
		self.ips.write().await.remove(&ip);
		self.persist().await;
	}

	pub async fn list(&self) -> Vec<IpAddr> {
		self.ips.read().await.iter().copied().collect()
	}

	async fn persist(&self) {
		let Some(path) = &self.path else { return };
		let ips: Vec<IpAddr> = self.list().await;
		if let Ok(json) = serde_json::to_string(&ips) {
			let _ = tokio::fs::write(path, json).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	#[tokio::test]
	async fn ban_and_unban_round_trip() {
		let set = BanSet::new(None);
		let ip = IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9));
		assert!(!set.is_banned(ip).await);
		set.ban(ip).await;
		assert!(set.is_banned(ip).await);
		set.unban(ip).await;
		assert!(!set.is_banned(ip).await);
	}
}
