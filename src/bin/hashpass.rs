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

//! Process entrypoint: loads configuration, assembles `AppState`, spawns
//! the background maintenance tasks (session sweeper, Timeout Watcher,
//! Hashrate Aggregator), and serves the HTTP/WebSocket API.

use std::net::SocketAddr;
use std::sync::Arc;

use hashpass::audit::AuditLog;
use hashpass::ban::BanSet;
use hashpass::captcha::CaptchaClient;
use hashpass::config::Config;
use hashpass::control::AdminAuth;
use hashpass::hashrate;
use hashpass::http;
use hashpass::logging::{self, LoggingConfig};
use hashpass::pow::WorkerPool;
use hashpass::puzzle::PuzzleEngine;
use hashpass::registry::ConnectionRegistry;
use hashpass::session::SessionStore;
use hashpass::stats::SubmissionStats;
use hashpass::timeout_watcher;
use hashpass::webhook::WebhookNotifier;
use hashpass::state::AppState;

#[tokio::main]
async fn main() {
	logging::init(&LoggingConfig::default());

	let config = match Config::from_env() {
		Ok(config) => Arc::new(config),
		Err(e) => {
			log::error!("configuration error: {}", e);
			std::process::exit(1);
		}
	};

	let worker_pool = Arc::new(WorkerPool::new(config.worker_count));
	let audit = Arc::new(AuditLog::new(config.audit_log_path.clone()));

	let engine = Arc::new(PuzzleEngine::new(
		config.difficulty.clone(),
		config.initial_difficulty,
		config.argon2.clone(),
		worker_pool.clone(),
		config.hmac_secret.clone(),
		config.max_nonce_speed,
	));
	let recent_solve_times = audit.recent_solve_times(config.difficulty.ema_window as usize).await;
	if !recent_solve_times.is_empty() {
		engine.warm_start_difficulty(&recent_solve_times).await;
		log::info!(
			"warm-started difficulty controller from {} audit-log solves",
			recent_solve_times.len()
		);
	}

	let sessions = Arc::new(SessionStore::new(config.session_expiry));
	let registry = Arc::new(ConnectionRegistry::new());
	let bans = Arc::new(BanSet::new(config.ban_set_path.clone()));
	let captcha = Arc::new(CaptchaClient::new(
		config.turnstile_secret_key.clone(),
		config.turnstile_test_mode,
	));
	let webhook = Arc::new(WebhookNotifier::new(config.webhook_url.clone(), config.webhook_token.clone()));
	let stats = Arc::new(SubmissionStats::default());
	let admin_auth = Arc::new(AdminAuth::new(
		config.admin_token.clone(),
		config.admin_lockout_threshold,
		config.admin_lockout_duration,
	));
	let hashrate_history = hashrate::new_history();

	let state = AppState {
		config: config.clone(),
		engine: engine.clone(),
		sessions: sessions.clone(),
		registry: registry.clone(),
		bans,
		worker_pool,
		captcha,
		webhook,
		audit,
		stats,
		admin_auth,
		hashrate_history: hashrate_history.clone(),
	};

	spawn_session_sweeper(sessions, config.session_sweep_interval);
	tokio::spawn(timeout_watcher::run(
		engine.clone(),
		registry.clone(),
		config.timeout_watch_interval,
	));
	tokio::spawn(hashrate::run(
		registry,
		hashrate_history,
		config.hashrate_sample_ttl,
		config.hashrate_tick_interval,
	));

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	log::info!("hashpass listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.unwrap_or_else(|e| panic!("failed to bind {}: {}", addr, e));
	axum::serve(
		listener,
		http::router(state).into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await
	.unwrap_or_else(|e| panic!("server error: {}", e));
}

fn spawn_session_sweeper(sessions: Arc<SessionStore>, interval: std::time::Duration) {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		loop {
			ticker.tick().await;
			sessions.sweep().await;
		}
	});
}
