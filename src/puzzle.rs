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

//! Puzzle Engine (spec section 2 component 5, spec 4.1): the single-winner
//! critical section. Everything that must stay linearizable with the
//! puzzle seed lives behind one `tokio::sync::Mutex` -- held across the
//! offloaded Argon2 verification on purpose (spec 5, spec 9): the mutex is
//! owned by the coordinator task that awaits the worker's result, never
//! handed to the worker itself.

use std::net::IpAddr;
use std::time::Instant;

use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, SolvedPuzzleRecord};
use crate::config::DifficultyConfig;
use crate::difficulty::DifficultyController;
use crate::error::{Error, ErrorKind};
use crate::invite;
use crate::pow::{self, Argon2Params, WorkerPool};
use crate::registry::{ConnId, ConnectionRegistry};
use crate::stats::SubmissionStats;
use crate::webhook::{SolvePayload, WebhookNotifier};
use crate::ws::ServerMessage;

const VISITOR_ID_MAX: usize = 128;
const SEED_MAX: usize = 128;
const TRACE_DATA_MAX: usize = 2048;
const HASH_MAX: usize = 256;
const NONCE_MAX: u64 = 9_007_199_254_740_992; // 2^53

#[derive(Clone, Debug, Deserialize)]
pub struct Submission {
	#[serde(rename = "visitorId")]
	pub visitor_id: String,
	pub nonce: u64,
	#[serde(rename = "submittedSeed")]
	pub submitted_seed: String,
	#[serde(rename = "traceData")]
	pub trace_data: String,
	pub hash: String,
}

impl Submission {
	pub fn validate(&self) -> Result<(), Error> {
		if self.visitor_id.is_empty() || self.visitor_id.len() > VISITOR_ID_MAX {
			return Err(ErrorKind::BadRequest("visitorId out of bounds".into()).into());
		}
		if self.nonce > NONCE_MAX {
			return Err(ErrorKind::BadRequest("nonce out of bounds".into()).into());
		}
		if self.submitted_seed.is_empty() || self.submitted_seed.len() > SEED_MAX {
			return Err(ErrorKind::BadRequest("submittedSeed out of bounds".into()).into());
		}
		if self.trace_data.len() > TRACE_DATA_MAX {
			return Err(ErrorKind::BadRequest("traceData out of bounds".into()).into());
		}
		if self.hash.is_empty() || self.hash.len() > HASH_MAX {
			return Err(ErrorKind::BadRequest("hash out of bounds".into()).into());
		}
		Ok(())
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct PuzzleView {
	pub seed: String,
	pub difficulty: u32,
	pub difficulty_float: f64,
	pub puzzle_start_time: i64,
	pub argon2: Argon2ParamsView,
}

#[derive(Clone, Debug, Serialize)]
pub struct Argon2ParamsView {
	pub time_cost: u32,
	pub memory_cost_kb: u32,
	pub parallelism: u32,
}

fn generate_seed() -> String {
	let mut bytes = [0u8; 16]; // 128-bit
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

struct EngineState {
	seed: String,
	puzzle_start_unix: i64,
	total_mining_time: f64,
	last_mining_state_change: Instant,
	active_miners: std::collections::HashSet<ConnId>,
	difficulty: DifficultyController,
	argon2_params: Argon2Params,
}

impl EngineState {
	fn mining_time_accumulator(&self) -> f64 {
		if self.active_miners.is_empty() {
			self.total_mining_time
		} else {
			self.total_mining_time + self.last_mining_state_change.elapsed().as_secs_f64()
		}
	}

	fn mining_start(&mut self, conn_id: ConnId) {
		if self.active_miners.is_empty() {
			self.last_mining_state_change = Instant::now();
		}
		self.active_miners.insert(conn_id);
	}

	fn mining_stop(&mut self, conn_id: ConnId) {
		if self.active_miners.remove(&conn_id) && self.active_miners.is_empty() {
			self.total_mining_time += self.last_mining_state_change.elapsed().as_secs_f64();
			self.last_mining_state_change = Instant::now();
		}
	}

	fn reset_puzzle(&mut self) {
		self.seed = generate_seed();
		self.total_mining_time = 0.0;
		self.active_miners.clear();
		self.last_mining_state_change = Instant::now();
		self.puzzle_start_unix = Utc::now().timestamp();
	}

	fn view(&self) -> PuzzleView {
		PuzzleView {
			seed: self.seed.clone(),
			difficulty: self.difficulty.difficulty(),
			difficulty_float: self.difficulty.difficulty_float(),
			puzzle_start_time: self.puzzle_start_unix,
			argon2: Argon2ParamsView {
				time_cost: self.argon2_params.time_cost,
				memory_cost_kb: self.argon2_params.memory_cost_kb,
				parallelism: self.argon2_params.parallelism,
			},
		}
	}
}

pub struct PuzzleEngine {
	state: tokio::sync::Mutex<EngineState>,
	worker_pool: std::sync::Arc<WorkerPool>,
	hmac_secret: std::sync::RwLock<Vec<u8>>,
	max_nonce_speed: std::sync::atomic::AtomicU64, // f64 bits, see helpers below
}

fn speed_to_bits(v: f64) -> u64 {
	v.to_bits()
}
fn speed_from_bits(v: u64) -> f64 {
	f64::from_bits(v)
}

impl PuzzleEngine {
	pub fn new(
		difficulty_config: DifficultyConfig,
		initial_difficulty: u32,
		argon2_params: Argon2Params,
		worker_pool: std::sync::Arc<WorkerPool>,
		hmac_secret: Vec<u8>,
		max_nonce_speed: f64,
	) -> PuzzleEngine {
		let state = EngineState {
			seed: generate_seed(),
			puzzle_start_unix: Utc::now().timestamp(),
			total_mining_time: 0.0,
			last_mining_state_change: Instant::now(),
			active_miners: std::collections::HashSet::new(),
			difficulty: DifficultyController::new(difficulty_config, initial_difficulty),
			argon2_params,
		};
		PuzzleEngine {
			state: tokio::sync::Mutex::new(state),
			worker_pool,
			hmac_secret: std::sync::RwLock::new(hmac_secret),
			max_nonce_speed: std::sync::atomic::AtomicU64::new(speed_to_bits(max_nonce_speed)),
		}
	}

	pub async fn view(&self) -> PuzzleView {
		self.state.lock().await.view()
	}

	pub async fn mining_start(&self, conn_id: ConnId) {
		self.state.lock().await.mining_start(conn_id);
	}

	pub async fn mining_stop(&self, conn_id: ConnId) {
		self.state.lock().await.mining_stop(conn_id);
	}

	/// Current overspeed threshold (0 disables the check), exposed for the
	/// Hashrate Aggregator's overspeed routing (spec 4.5).
	pub fn max_nonce_speed(&self) -> f64 {
		speed_from_bits(self.max_nonce_speed.load(std::sync::atomic::Ordering::Relaxed))
	}

	pub fn set_max_nonce_speed(&self, v: f64) {
		self.max_nonce_speed
			.store(speed_to_bits(v), std::sync::atomic::Ordering::Relaxed);
	}

	pub fn set_hmac_secret(&self, secret: Vec<u8>) {
		*self.hmac_secret.write().expect("hmac secret lock poisoned") = secret;
	}

	pub async fn set_argon2_params(&self, params: Argon2Params, registry: &ConnectionRegistry) {
		{
			let mut state = self.state.lock().await;
			state.argon2_params = params;
		}
		self.force_reset(registry).await;
	}

	pub async fn set_difficulty_config(&self, config: DifficultyConfig, registry: &ConnectionRegistry) {
		{
			let mut state = self.state.lock().await;
			state.difficulty.set_config(config);
		}
		self.force_reset(registry).await;
	}

	pub async fn warm_start_difficulty(&self, recent_solve_times: &[f64]) {
		self.state.lock().await.difficulty.warm_start(recent_solve_times);
	}

	/// Unconditional reset, used by the Control Plane and by parameter
	/// changes (spec 4.10: "must immediately reset the puzzle").
	pub async fn force_reset(&self, registry: &ConnectionRegistry) {
		let snapshot = {
			let mut state = self.state.lock().await;
			state.reset_puzzle();
			let view = state.view();
			ServerMessage::PuzzleReset {
				seed: view.seed,
				difficulty: view.difficulty,
				solve_time: 0.0,
				average_solve_time: state.difficulty.average_solve_time(),
				puzzle_start_time: view.puzzle_start_time,
			}
		};
		registry.broadcast(&snapshot).await;
	}

	/// Timeout Watcher tick (spec 4.6): if accumulated mining time has
	/// reached `target_timeout`, forces a reset with a virtual solve time.
	pub async fn handle_timeout_tick(&self, registry: &ConnectionRegistry) {
		let snapshot = {
			let mut state = self.state.lock().await;
			let target_timeout = state.difficulty.config().target_timeout;
			if state.mining_time_accumulator() < target_timeout {
				return;
			}
			state.difficulty.record_solve(target_timeout);
			state.reset_puzzle();
			let view = state.view();
			ServerMessage::PuzzleReset {
				seed: view.seed,
				difficulty: view.difficulty,
				solve_time: target_timeout,
				average_solve_time: state.difficulty.average_solve_time(),
				puzzle_start_time: view.puzzle_start_time,
			}
		};
		registry.broadcast(&snapshot).await;
	}

	/// The single-winner critical section (spec 4.1).
	#[allow(clippy::too_many_arguments)]
	pub async fn submit(
		&self,
		submission: &Submission,
		request_ip: IpAddr,
		registry: &ConnectionRegistry,
		audit: &AuditLog,
		webhook: &WebhookNotifier,
		stats: &SubmissionStats,
	) -> Result<String, Error> {
		submission.validate()?;

		// Step 1: fast-fail outside M.
		{
			let state = self.state.lock().await;
			if submission.submitted_seed != state.seed {
				stats.record_stale(request_ip).await;
				return Err(ErrorKind::PuzzleStale.into());
			}
		}

		// Step 2: anti-spoof outside M.
		let expected_substr = format!("ip={}", request_ip);
		if !submission.trace_data.contains(&expected_substr) {
			stats.record_rejected(request_ip).await;
			return Err(ErrorKind::IdentityMismatch.into());
		}

		// Step 3/4: acquire M, double-check.
		let mut guard = self.state.lock().await;
		if submission.submitted_seed != guard.seed {
			stats.record_stale(request_ip).await;
			return Err(ErrorKind::PuzzleStale.into());
		}

		// Step 5: solve time.
		let solve_time = guard.mining_time_accumulator();

		// Step 6: speed check.
		let max_speed = self.max_nonce_speed();
		if max_speed > 0.0 && solve_time > 0.0 {
			let observed_speed = submission.nonce as f64 / solve_time;
			if observed_speed > max_speed {
				stats.record_rejected(request_ip).await;
				return Err(ErrorKind::SpeedTooHigh(observed_speed).into());
			}
		}

		// Step 7: offload to the Worker Pool.
		let salt = pow::build_salt(&guard.seed, &submission.visitor_id, &submission.trace_data);
		let params = guard.argon2_params.clone();
		let outcome = self
			.worker_pool
			.verify_submission(submission.nonce.to_string(), salt, submission.hash.clone(), params)
			.await
			.map_err(|e| Error::from(ErrorKind::Internal(e)))?;

		let required = guard.difficulty.difficulty();
		if !outcome.hash_matches {
			stats.record_rejected(request_ip).await;
			return Err(ErrorKind::BadSolutionMismatch.into());
		}
		if outcome.leading_zero_bits < required {
			stats.record_rejected(request_ip).await;
			return Err(ErrorKind::BadSolutionDifficulty {
				needed: required,
				got: outcome.leading_zero_bits,
			}
			.into());
		}

		// Step 9: derive the invite code.
		let hmac_secret = self.hmac_secret.read().expect("hmac secret lock poisoned").clone();
		let invite_code = invite::derive(&hmac_secret, &submission.visitor_id, submission.nonce, &guard.seed);

		// Step 10: schedule the webhook notification (never blocks this call).
		webhook.notify(SolvePayload {
			visitor_id: submission.visitor_id.clone(),
			invite_code: invite_code.clone(),
			difficulty: required,
			solve_time,
		});

		// Step 11: difficulty controller.
		let new_difficulty = guard.difficulty.record_solve(solve_time);
		let average_solve_time = guard.difficulty.average_solve_time();

		// Step 12/13: build the reset snapshot, reset, while still holding M.
		let old_seed = guard.seed.clone();
		guard.reset_puzzle();
		let new_seed = guard.seed.clone();
		let new_puzzle_start_time = guard.puzzle_start_unix;

		// Step 14: release M.
		drop(guard);
		stats.record_accepted(request_ip).await;

		// Step 15: broadcast outside M, schedule the audit-log append.
		let reset_message = ServerMessage::PuzzleReset {
			seed: new_seed,
			difficulty: new_difficulty,
			solve_time,
			average_solve_time,
			puzzle_start_time: new_puzzle_start_time,
		};
		registry.broadcast(&reset_message).await;

		audit
			.append(SolvedPuzzleRecord {
				seed: old_seed,
				difficulty: required,
				solve_time,
				visitor_id: submission.visitor_id.clone(),
				nonce: submission.nonce,
				invite_code: invite_code.clone(),
				timestamp: Utc::now().timestamp(),
			})
			.await;

		// Step 16.
		Ok(invite_code)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{IpAddr, Ipv4Addr};

	fn small_argon2() -> Argon2Params {
		Argon2Params {
			time_cost: 1,
			memory_cost_kb: 8,
			parallelism: 1,
		}
	}

	fn difficulty_config() -> DifficultyConfig {
		DifficultyConfig {
			d_min: 0,
			d_max: 32,
			target_time: 75.0,
			target_timeout: 600.0,
			ema_window: 5,
		}
	}

	fn ip() -> IpAddr {
		IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))
	}

	fn pool() -> std::sync::Arc<WorkerPool> {
		std::sync::Arc::new(WorkerPool::new(1))
	}

	#[tokio::test]
	async fn rejects_stale_seed_before_touching_the_lock() {
		let engine = PuzzleEngine::new(difficulty_config(), 0, small_argon2(), pool(), b"k".to_vec(), 0.0);
		let registry = ConnectionRegistry::new();
		let audit = AuditLog::new(std::env::temp_dir().join("unused-audit.json").to_string_lossy().to_string());
		let webhook = WebhookNotifier::new(None, None);
		let stats = SubmissionStats::default();

		let submission = Submission {
			visitor_id: "v1".into(),
			nonce: 1,
			submitted_seed: "not-the-seed".into(),
			trace_data: format!("ip={}", ip()),
			hash: "00".into(),
		};

		let result = engine
			.submit(&submission, ip(), &registry, &audit, &webhook, &stats)
			.await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::PuzzleStale)));
	}

	#[tokio::test]
	async fn rejects_identity_mismatch_before_touching_the_lock() {
		let engine = PuzzleEngine::new(difficulty_config(), 0, small_argon2(), pool(), b"k".to_vec(), 0.0);
		let registry = ConnectionRegistry::new();
		let audit = AuditLog::new(std::env::temp_dir().join("unused-audit2.json").to_string_lossy().to_string());
		let webhook = WebhookNotifier::new(None, None);
		let stats = SubmissionStats::default();

		let seed = engine.view().await.seed;
		let submission = Submission {
			visitor_id: "v1".into(),
			nonce: 1,
			submitted_seed: seed,
			trace_data: "ip=9.9.9.9".into(),
			hash: "00".into(),
		};

		let result = engine
			.submit(&submission, ip(), &registry, &audit, &webhook, &stats)
			.await;
		assert!(matches!(result, Err(e) if matches!(e.kind(), ErrorKind::IdentityMismatch)));
	}

	#[tokio::test]
	async fn mining_timer_only_advances_while_a_miner_is_active() {
		let engine = PuzzleEngine::new(difficulty_config(), 0, small_argon2(), pool(), b"k".to_vec(), 0.0);
		{
			let state = engine.state.lock().await;
			assert_eq!(state.mining_time_accumulator(), 0.0);
		}
		engine.mining_start(1).await;
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		{
			let state = engine.state.lock().await;
			assert!(state.mining_time_accumulator() > 0.0);
		}
		engine.mining_stop(1).await;
		let accumulated = {
			let state = engine.state.lock().await;
			state.mining_time_accumulator()
		};
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		let accumulated_later = {
			let state = engine.state.lock().await;
			state.mining_time_accumulator()
		};
		assert_eq!(accumulated, accumulated_later, "timer must not advance with zero miners");
	}
}
