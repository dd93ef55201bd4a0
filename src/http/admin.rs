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

//! Admin routes under `/api/admin/*` (spec 4.10, spec 6): privileged
//! parameter mutation, ban/kick operations, and forced resets. Every
//! handler re-authenticates with `require_admin` independently, matching
//! the spec's "authenticated by a shared admin bearer token" contract
//! per-call rather than via a session.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::DifficultyConfig;
use crate::control::ControlPlane;
use crate::error::{Error, ErrorKind};
use crate::http::auth::require_admin;
use crate::pow::Argon2Params;
use crate::state::AppState;

fn control_plane(state: &AppState) -> ControlPlane {
	ControlPlane {
		engine: state.engine.clone(),
		sessions: state.sessions.clone(),
		registry: state.registry.clone(),
		bans: state.bans.clone(),
		worker_pool: state.worker_pool.clone(),
	}
}

async fn authenticate(state: &AppState, headers: &HeaderMap, addr: SocketAddr) -> Result<(), Error> {
	require_admin(state, headers, addr.ip()).await
}

pub async fn stats(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	Ok(Json(json!({
		"submissions": state.stats.snapshot().await,
		"connections": state.registry.connection_count().await,
		"sessions": state.sessions.len().await,
		"puzzle": state.engine.view().await,
		"hashrate_history": state.hashrate_history.snapshot().await,
		"bans": state.bans.list().await,
	})))
}

#[derive(Deserialize)]
pub struct DifficultyRequest {
	pub d_min: u32,
	pub d_max: u32,
	pub target_time: f64,
	pub target_timeout: f64,
}

pub async fn set_difficulty(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<DifficultyRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	if body.d_min > body.d_max || body.target_time <= 0.0 || body.target_timeout <= 0.0 {
		return Err(ErrorKind::BadRequest("difficulty parameters out of range".into()).into());
	}
	control_plane(&state)
		.set_difficulty_config(DifficultyConfig {
			d_min: body.d_min,
			d_max: body.d_max,
			target_time: body.target_time,
			target_timeout: body.target_timeout,
			ema_window: 5,
		})
		.await;
	Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct Argon2Request {
	pub time_cost: u32,
	pub memory_cost_kb: u32,
	pub parallelism: u32,
}

pub async fn set_argon2(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<Argon2Request>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	if body.time_cost == 0 || body.memory_cost_kb == 0 || body.parallelism == 0 {
		return Err(ErrorKind::BadRequest("argon2 parameters must be positive".into()).into());
	}
	control_plane(&state)
		.set_argon2_params(Argon2Params {
			time_cost: body.time_cost,
			memory_cost_kb: body.memory_cost_kb,
			parallelism: body.parallelism,
		})
		.await;
	Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct WorkerCountRequest {
	pub count: usize,
}

pub async fn set_worker_count(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<WorkerCountRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	if body.count == 0 {
		return Err(ErrorKind::BadRequest("worker count must be at least 1".into()).into());
	}
	control_plane(&state).set_worker_count(body.count).await;
	Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct MaxNonceSpeedRequest {
	pub value: f64,
}

pub async fn set_max_nonce_speed(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<MaxNonceSpeedRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	if body.value < 0.0 {
		return Err(ErrorKind::BadRequest("max nonce speed must be non-negative".into()).into());
	}
	control_plane(&state).set_max_nonce_speed(body.value);
	Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct HmacSecretRequest {
	/// Hex-encoded secret, at least 128 bits. Omitted to rotate to a fresh
	/// random secret (spec 4.10 "regenerate/set HMAC secret").
	pub secret_hex: Option<String>,
}

pub async fn set_hmac_secret(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<HmacSecretRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	let secret = match body.secret_hex {
		Some(hex_str) => {
			let decoded =
				hex::decode(&hex_str).map_err(|_| Error::from(ErrorKind::BadRequest("invalid hex".into())))?;
			if decoded.len() * 8 < 128 {
				return Err(ErrorKind::BadRequest("secret must be at least 128 bits".into()).into());
			}
			decoded
		}
		None => {
			let mut buf = [0u8; 32];
			use rand::RngCore;
			rand::thread_rng().fill_bytes(&mut buf);
			buf.to_vec()
		}
	};
	control_plane(&state).set_hmac_secret(secret);
	Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct IpRequest {
	pub ip: IpAddr,
}

pub async fn ban(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<IpRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).ban_ip(body.ip).await;
	Ok(Json(json!({ "ok": true })))
}

pub async fn unban(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<IpRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).unban_ip(body.ip).await;
	Ok(Json(json!({ "ok": true })))
}

pub async fn kick(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(body): Json<IpRequest>,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).kick_ip(body.ip).await;
	Ok(Json(json!({ "ok": true })))
}

pub async fn kick_all(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).kick_all().await;
	Ok(Json(json!({ "ok": true })))
}

pub async fn reset(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).force_reset().await;
	Ok(Json(json!({ "ok": true })))
}

pub async fn clear_sessions(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
) -> Result<Json<Value>, Error> {
	authenticate(&state, &headers, addr).await?;
	control_plane(&state).clear_sessions().await;
	Ok(Json(json!({ "ok": true })))
}
