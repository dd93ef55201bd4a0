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

//! `GET /api/dev/trace` (spec 6): a plaintext trace stub for local
//! development, standing in for whatever bot-detection telemetry a
//! production front-end would normally embed. Its only contractual
//! property is that it contains the literal substring `ip=<remote ip>`
//! the Puzzle Engine's anti-spoof check looks for (spec 4.1 step 2).

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use chrono::Utc;

pub async fn dev_trace(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> String {
	format!("ip={}\nts={}\n", addr.ip(), Utc::now().timestamp())
}
