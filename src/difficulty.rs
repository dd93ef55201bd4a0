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

//! Difficulty Controller (spec 4.2): an EMA-smoothed proportional
//! controller over a fractional difficulty value, clamped to
//! `[D_min, D_max]`.

use crate::config::DifficultyConfig;

#[derive(Clone, Debug)]
pub struct DifficultyController {
	config: DifficultyConfig,
	difficulty_float: f64,
	ema_solve_time: Option<f64>,
	/// Bounded ring buffer of recent solve times (spec 9: "no unbounded
	/// growth is permitted on any hot path").
	history: Vec<f64>,
}

const HISTORY_CAPACITY: usize = 50;

impl DifficultyController {
	pub fn new(config: DifficultyConfig, initial_difficulty: u32) -> DifficultyController {
		DifficultyController {
			difficulty_float: initial_difficulty as f64,
			ema_solve_time: None,
			history: Vec::with_capacity(HISTORY_CAPACITY),
			config,
		}
	}

	pub fn difficulty(&self) -> u32 {
		self.difficulty_float.round() as u32
	}

	pub fn difficulty_float(&self) -> f64 {
		self.difficulty_float
	}

	pub fn average_solve_time(&self) -> Option<f64> {
		self.ema_solve_time
	}

	pub fn config(&self) -> &DifficultyConfig {
		&self.config
	}

	pub fn set_config(&mut self, config: DifficultyConfig) {
		self.config = config;
		self.clamp();
	}

	/// Records a (possibly virtual, see spec 4.6) solve time and steps the
	/// controller. Returns the new integer difficulty.
	pub fn record_solve(&mut self, solve_time: f64) -> u32 {
		if solve_time <= 0.0 {
			return self.difficulty();
		}

		self.ema_solve_time = Some(match self.ema_solve_time {
			None => solve_time,
			Some(prev) => {
				let alpha = self.config.ema_alpha();
				alpha * solve_time + (1.0 - alpha) * prev
			}
		});

		self.push_history(solve_time);

		let ema = self.ema_solve_time.unwrap();
		let step = (self.config.target_time / ema).log2().clamp(-4.0, 4.0);
		self.difficulty_float += step;
		self.clamp();

		self.difficulty()
	}

	/// Warm-starts the EMA by replaying up to `ema_window` recent solve
	/// times, oldest first (spec 4.2 "startup... may warm-start").
	pub fn warm_start(&mut self, recent_solve_times: &[f64]) {
		let window = self.config.ema_window as usize;
		let start = recent_solve_times.len().saturating_sub(window);
		for &t in &recent_solve_times[start..] {
			if t > 0.0 {
				self.ema_solve_time = Some(match self.ema_solve_time {
					None => t,
					Some(prev) => {
						let alpha = self.config.ema_alpha();
						alpha * t + (1.0 - alpha) * prev
					}
				});
				self.push_history(t);
			}
		}
	}

	fn push_history(&mut self, t: f64) {
		if self.history.len() == HISTORY_CAPACITY {
			self.history.remove(0);
		}
		self.history.push(t);
	}

	fn clamp(&mut self) {
		let (min, max) = (self.config.d_min as f64, self.config.d_max as f64);
		if self.difficulty_float < min {
			self.difficulty_float = min;
		} else if self.difficulty_float > max {
			self.difficulty_float = max;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> DifficultyConfig {
		DifficultyConfig {
			d_min: 4,
			d_max: 32,
			target_time: 75.0,
			target_timeout: 600.0,
			ema_window: 5,
		}
	}

	#[test]
	fn clamps_to_configured_range() {
		let mut ctrl = DifficultyController::new(cfg(), 16);
		for _ in 0..100 {
			ctrl.record_solve(10_000.0);
		}
		assert!(ctrl.difficulty() >= 4);
		assert!(ctrl.difficulty() <= 32);
	}

	#[test]
	fn single_step_bounded_by_four() {
		let mut ctrl = DifficultyController::new(cfg(), 16);
		let before = ctrl.difficulty_float();
		ctrl.record_solve(0.001);
		let after = ctrl.difficulty_float();
		assert!((after - before).abs() <= 4.0 + 1e-9);
	}

	#[test]
	fn slow_solves_drive_difficulty_down() {
		// Target time 75s; five solves of 300s drive EMA to 300, step =
		// log2(75/300) = -2 per solve (spec scenario 4).
		let mut ctrl = DifficultyController::new(cfg(), 20);
		for _ in 0..5 {
			ctrl.record_solve(300.0);
		}
		let ema = ctrl.average_solve_time().unwrap();
		assert!((ema - 300.0).abs() < 1e-6);
	}

	#[test]
	fn zero_or_negative_solve_time_is_a_noop() {
		let mut ctrl = DifficultyController::new(cfg(), 16);
		let before = ctrl.difficulty_float();
		ctrl.record_solve(0.0);
		assert_eq!(ctrl.difficulty_float(), before);
		assert!(ctrl.average_solve_time().is_none());
	}
}
