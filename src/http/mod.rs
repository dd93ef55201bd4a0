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

//! HTTP/WebSocket surface (spec 6): router assembly and the outer
//! middleware stack. Individual handlers are thin shells delegating into
//! the core components held by `AppState`.

mod admin;
mod auth;
mod dev;
mod health;
mod middleware;
mod puzzle;
mod turnstile;
mod verify;
mod ws;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	let admin_routes = Router::new()
		.route("/stats", get(admin::stats))
		.route("/difficulty", post(admin::set_difficulty))
		.route("/argon2", post(admin::set_argon2))
		.route("/worker_count", post(admin::set_worker_count))
		.route("/max_nonce_speed", post(admin::set_max_nonce_speed))
		.route("/hmac_secret", post(admin::set_hmac_secret))
		.route("/ban", post(admin::ban))
		.route("/unban", post(admin::unban))
		.route("/kick", post(admin::kick))
		.route("/kick_all", post(admin::kick_all))
		.route("/reset", post(admin::reset))
		.route("/clear_sessions", post(admin::clear_sessions));

	// Routes carry the full `/api/...` path directly (rather than being
	// `.nest()`-ed under it) so the UA-filter middleware below sees the same
	// `req.uri().path()` it would see mounted at the server root.
	Router::new()
		.route("/api/health", get(health::health))
		.route("/api/puzzle", get(puzzle::get_puzzle))
		.route("/api/verify", post(verify::verify))
		.route("/api/turnstile/config", get(turnstile::turnstile_config))
		.route("/api/dev/trace", get(dev::dev_trace))
		.route("/api/ws", get(ws::ws_handler))
		.nest("/api/admin", admin_routes)
		.layer(axum::middleware::from_fn(middleware::require_browser_ua))
		.layer(axum::middleware::from_fn(middleware::security_headers))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
