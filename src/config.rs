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

//! Process-environment configuration.
//!
//! Mirrors the shape of the teacher's `grin_config` crate (a typed members
//! struct with documented defaults) but reads from the process environment
//! rather than a TOML file, since that is the deployment model the spec
//! calls for.

use std::env;
use std::time::Duration;

use crate::pow::Argon2Params;

#[derive(Clone, Debug)]
pub struct DifficultyConfig {
	pub d_min: u32,
	pub d_max: u32,
	pub target_time: f64,
	pub target_timeout: f64,
	/// Smoothing window N for the EMA; alpha = 2 / (n + 1).
	pub ema_window: u32,
}

impl DifficultyConfig {
	pub fn ema_alpha(&self) -> f64 {
		2.0 / (self.ema_window as f64 + 1.0)
	}
}

#[derive(Clone, Debug)]
pub struct Config {
	pub port: u16,
	pub initial_difficulty: u32,
	pub difficulty: DifficultyConfig,
	pub argon2: Argon2Params,
	pub worker_count: usize,
	pub max_nonce_speed: f64,
	pub hmac_secret: Vec<u8>,
	pub admin_token: String,
	pub turnstile_site_key: String,
	pub turnstile_secret_key: String,
	pub turnstile_test_mode: bool,
	pub webhook_url: Option<String>,
	pub webhook_token: Option<String>,
	pub session_expiry: Duration,
	pub session_sweep_interval: Duration,
	pub timeout_watch_interval: Duration,
	pub hashrate_tick_interval: Duration,
	pub hashrate_sample_ttl: Duration,
	pub admin_lockout_threshold: u32,
	pub admin_lockout_duration: Duration,
	pub audit_log_path: String,
	pub ban_set_path: Option<String>,
}

fn env_or(name: &str, default: &str) -> String {
	env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
	env::var(name)
		.ok()
		.and_then(|v| v.parse().ok())
		.unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
	match env::var(name) {
		Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"),
		Err(_) => default,
	}
}

impl Config {
	/// Builds configuration from the process environment. Fails fast on
	/// missing CAPTCHA keys unless test mode is explicitly requested, per
	/// the spec's startup-error contract.
	pub fn from_env() -> Result<Config, String> {
		let turnstile_test_mode = env_bool("TURNSTILE_TEST_MODE", false);
		let turnstile_site_key = env_or("TURNSTILE_SITE_KEY", "");
		let turnstile_secret_key = env_or("TURNSTILE_SECRET_KEY", "");

		if !turnstile_test_mode && (turnstile_site_key.is_empty() || turnstile_secret_key.is_empty())
		{
			return Err(
				"TURNSTILE_SITE_KEY and TURNSTILE_SECRET_KEY must be set unless \
				 TURNSTILE_TEST_MODE=1"
					.to_string(),
			);
		}

		let hmac_secret_hex = env_or("HASHPASS_HMAC_SECRET", "");
		let hmac_secret = if hmac_secret_hex.is_empty() {
			// Ephemeral secret: fine for a single process lifetime, but every
			// restart invalidates outstanding invite codes (documented
			// behavior, not a bug -- see DESIGN.md).
			let mut buf = [0u8; 32];
			use rand::RngCore;
			rand::thread_rng().fill_bytes(&mut buf);
			buf.to_vec()
		} else {
			hex::decode(&hmac_secret_hex).map_err(|e| format!("invalid HASHPASS_HMAC_SECRET: {}", e))?
		};
		if hmac_secret.len() * 8 < 128 {
			return Err("HASHPASS_HMAC_SECRET must decode to at least 128 bits".to_string());
		}

		Ok(Config {
			port: env_parse("PORT", 8080),
			initial_difficulty: env_parse("HASHPASS_DIFFICULTY", 16),
			difficulty: DifficultyConfig {
				d_min: env_parse("HASHPASS_MIN_DIFFICULTY", 8),
				d_max: env_parse("HASHPASS_MAX_DIFFICULTY", 32),
				target_time: env_parse("HASHPASS_TARGET_TIME", 75.0),
				target_timeout: env_parse("HASHPASS_TARGET_TIMEOUT", 600.0),
				ema_window: 5,
			},
			argon2: Argon2Params {
				time_cost: env_parse("HASHPASS_ARGON2_TIME_COST", 3),
				memory_cost_kb: env_parse("HASHPASS_ARGON2_MEMORY_COST", 65536),
				parallelism: env_parse("HASHPASS_ARGON2_PARALLELISM", 1),
			},
			worker_count: env_parse("HASHPASS_WORKER_COUNT", default_worker_count()),
			max_nonce_speed: env_parse("HASHPASS_MAX_NONCE_SPEED", 0.0),
			hmac_secret,
			admin_token: env_or("ADMIN_TOKEN", ""),
			turnstile_site_key,
			turnstile_secret_key,
			turnstile_test_mode,
			webhook_url: env::var("WEBHOOK_URL").ok(),
			webhook_token: env::var("WEBHOOK_TOKEN").ok(),
			session_expiry: Duration::from_secs(300),
			session_sweep_interval: Duration::from_secs(60),
			timeout_watch_interval: Duration::from_secs(5),
			hashrate_tick_interval: Duration::from_secs(5),
			hashrate_sample_ttl: Duration::from_secs(10),
			admin_lockout_threshold: 10,
			admin_lockout_duration: Duration::from_secs(300),
			audit_log_path: env_or("HASHPASS_AUDIT_LOG", "hashpass-audit.log"),
			ban_set_path: env::var("HASHPASS_BAN_SET_PATH").ok(),
		})
	}
}

fn default_worker_count() -> usize {
	std::thread::available_parallelism()
		.map(|n| n.get().saturating_sub(1).max(1))
		.unwrap_or(1)
}
