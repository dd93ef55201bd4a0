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

//! Process-wide shared state (spec 9: "model them as one top-level value
//! constructed at startup and passed by reference"), assembled once in
//! `main` and handed to axum as `State<AppState>`.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::ban::BanSet;
use crate::captcha::CaptchaClient;
use crate::config::Config;
use crate::control::AdminAuth;
use crate::hashrate::HashrateHistory;
use crate::pow::WorkerPool;
use crate::puzzle::PuzzleEngine;
use crate::registry::ConnectionRegistry;
use crate::session::SessionStore;
use crate::stats::SubmissionStats;
use crate::webhook::WebhookNotifier;

#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub engine: Arc<PuzzleEngine>,
	pub sessions: Arc<SessionStore>,
	pub registry: Arc<ConnectionRegistry>,
	pub bans: Arc<BanSet>,
	pub worker_pool: Arc<WorkerPool>,
	pub captcha: Arc<CaptchaClient>,
	pub webhook: Arc<WebhookNotifier>,
	pub audit: Arc<AuditLog>,
	pub stats: Arc<SubmissionStats>,
	pub admin_auth: Arc<AdminAuth>,
	pub hashrate_history: Arc<HashrateHistory>,
}
