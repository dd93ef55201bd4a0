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

//! Control Plane (spec 4.10): privileged operations gated by a shared admin
//! bearer token, with a per-IP brute-force lockout modeled on the same
//! failure-counter shape the teacher's stratum server keeps for banned
//! workers (`grin_servers::mining::stratumserver`).

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::ban::BanSet;
use crate::config::DifficultyConfig;
use crate::error::{Error, ErrorKind};
use crate::pow::{Argon2Params, WorkerPool};
use crate::puzzle::PuzzleEngine;
use crate::registry::ConnectionRegistry;
use crate::session::SessionStore;

struct LockoutEntry {
	failures: u32,
	locked_until: Option<Instant>,
}

/// Constant-time admin bearer check plus exponential lockout after
/// `threshold` consecutive failures from the same IP (spec 4.10, spec 7).
pub struct AdminAuth {
	token: String,
	threshold: u32,
	lockout_duration: Duration,
	failures: Mutex<HashMap<IpAddr, LockoutEntry>>,
}

impl AdminAuth {
	pub fn new(token: String, threshold: u32, lockout_duration: Duration) -> AdminAuth {
		AdminAuth {
			token,
			threshold,
			lockout_duration,
			failures: Mutex::new(HashMap::new()),
		}
	}

	pub async fn check(&self, provided: &str, ip: IpAddr) -> Result<(), Error> {
		if self.token.is_empty() {
			return Err(ErrorKind::AdminNotConfigured.into());
		}

		let mut failures = self.failures.lock().await;
		if let Some(entry) = failures.get(&ip) {
			if let Some(locked_until) = entry.locked_until {
				if Instant::now() < locked_until {
					return Err(ErrorKind::AdminLockedOut.into());
				}
			}
		}

		let matches: bool = self.token.as_bytes().ct_eq(provided.as_bytes()).into();
		if matches {
			failures.remove(&ip);
			return Ok(());
		}

		let entry = failures.entry(ip).or_insert(LockoutEntry {
			failures: 0,
			locked_until: None,
		});
		entry.failures += 1;
		if entry.failures >= self.threshold {
			entry.locked_until = Some(Instant::now() + self.lockout_duration);
			return Err(ErrorKind::AdminLockedOut.into());
		}
		Err(ErrorKind::AdminForbidden.into())
	}
}

/// The set of collaborators a privileged operation may need to touch.
/// Every mutation that changes the puzzle's economic parameters ends with
/// an unconditional `PuzzleEngine::force_reset` (spec 4.10).
pub struct ControlPlane {
	pub engine: Arc<PuzzleEngine>,
	pub sessions: Arc<SessionStore>,
	pub registry: Arc<ConnectionRegistry>,
	pub bans: Arc<BanSet>,
	pub worker_pool: Arc<WorkerPool>,
}

impl ControlPlane {
	pub async fn set_difficulty_config(&self, config: DifficultyConfig) {
		self.engine.set_difficulty_config(config, &self.registry).await;
	}

	pub async fn set_argon2_params(&self, params: Argon2Params) {
		self.engine.set_argon2_params(params, &self.registry).await;
	}

	pub async fn set_worker_count(&self, count: usize) {
		self.worker_pool.resize(count).await;
	}

	pub fn set_max_nonce_speed(&self, speed: f64) {
		self.engine.set_max_nonce_speed(speed);
	}

	/// Sets or rotates the HMAC secret. Does not reset the puzzle (the
	/// secret affects only invite-code derivation, not the economic
	/// parameters clients observe).
	pub fn set_hmac_secret(&self, secret: Vec<u8>) {
		self.engine.set_hmac_secret(secret);
	}

	pub async fn ban_ip(&self, ip: IpAddr) {
		self.bans.ban(ip).await;
		self.registry.close_ip(ip, 1000, "Banned").await;
		self.sessions.revoke_by_ip(ip).await;
	}

	pub async fn unban_ip(&self, ip: IpAddr) {
		self.bans.unban(ip).await;
	}

	pub async fn kick_ip(&self, ip: IpAddr) {
		self.registry.close_ip(ip, 1000, "Kicked").await;
		self.sessions.revoke_by_ip(ip).await;
	}

	pub async fn kick_all(&self) {
		self.registry.close_all(1000, "Kicked").await;
		self.sessions.revoke_all().await;
	}

	pub async fn force_reset(&self) {
		self.engine.force_reset(&self.registry).await;
	}

	pub async fn clear_sessions(&self) {
		self.sessions.revoke_all().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::Ipv4Addr;

	fn ip() -> IpAddr {
		IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))
	}

	#[tokio::test]
	async fn accepts_the_correct_token() {
		let auth = AdminAuth::new("secret".into(), 10, Duration::from_secs(300));
		assert!(auth.check("secret", ip()).await.is_ok());
	}

	#[tokio::test]
	async fn an_unconfigured_admin_token_rejects_every_request() {
		let auth = AdminAuth::new(String::new(), 10, Duration::from_secs(300));
		let result = auth.check("", ip()).await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminNotConfigured)));
		let result = auth.check("anything", ip()).await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminNotConfigured)));
	}

	#[tokio::test]
	async fn locks_out_after_threshold_failures() {
		let auth = AdminAuth::new("secret".into(), 3, Duration::from_secs(300));
		for _ in 0..2 {
			let result = auth.check("wrong", ip()).await;
			assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminForbidden)));
		}
		let result = auth.check("wrong", ip()).await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminLockedOut)));
		let result = auth.check("secret", ip()).await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminLockedOut)));
	}

	#[tokio::test]
	async fn success_resets_the_failure_counter() {
		let auth = AdminAuth::new("secret".into(), 3, Duration::from_secs(300));
		auth.check("wrong", ip()).await.ok();
		auth.check("secret", ip()).await.unwrap();
		auth.check("wrong", ip()).await.ok();
		let result = auth.check("wrong", ip()).await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::AdminForbidden)));
	}
}
