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

//! HashPass: a single-winner, memory-hard proof-of-work invite-code
//! dispenser. See `README`/`DESIGN.md` for the architecture; each module
//! below corresponds to one component of the coordination engine.

pub mod admission;
pub mod audit;
pub mod ban;
pub mod captcha;
pub mod config;
pub mod control;
pub mod difficulty;
pub mod error;
pub mod hashrate;
pub mod http;
pub mod invite;
pub mod logging;
pub mod pow;
pub mod puzzle;
pub mod registry;
pub mod session;
pub mod state;
pub mod stats;
pub mod timeout_watcher;
pub mod webhook;
pub mod ws;
