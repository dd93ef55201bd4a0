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

//! Timeout Watcher (spec 4.6): a background task that forces a puzzle
//! reset -- with a virtual solve time -- when no one has solved the active
//! puzzle within `target_timeout`. Modeled on the teacher's periodic
//! `stratumserver` maintenance loops (a fixed-interval `tokio::time::interval`
//! tick calling back into shared state).

use std::sync::Arc;
use std::time::Duration;

use crate::puzzle::PuzzleEngine;
use crate::registry::ConnectionRegistry;

pub async fn run(engine: Arc<PuzzleEngine>, registry: Arc<ConnectionRegistry>, tick: Duration) {
	let mut interval = tokio::time::interval(tick);
	loop {
		interval.tick().await;
		engine.handle_timeout_tick(&registry).await;
	}
}
