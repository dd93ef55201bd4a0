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

//! Audit log of solved puzzles (spec 6 "Persisted state", spec 9): a JSON
//! array file, rotated into a timestamped archive every 1000 records. The
//! rotate-at-1000 read-modify-write scheme is single-writer by construction
//! here: every append is serialized behind `inner`, matching spec 9's note
//! that a parallel-runtime reimplementation must serialize writes to
//! preserve the JSON-array invariant.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const ROTATE_AT: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolvedPuzzleRecord {
	pub seed: String,
	pub difficulty: u32,
	pub solve_time: f64,
	pub visitor_id: String,
	pub nonce: u64,
	pub invite_code: String,
	pub timestamp: i64,
}

pub struct AuditLog {
	path: String,
	write_lock: Mutex<()>,
}

impl AuditLog {
	pub fn new(path: String) -> AuditLog {
		AuditLog {
			path,
			write_lock: Mutex::new(()),
		}
	}

	/// Appends one record, rotating the file into a timestamped archive
	/// once it would exceed `ROTATE_AT` entries. Failures are logged and
	/// swallowed (spec 7: "audit-log write errors" are never surfaced).
	pub async fn append(&self, record: SolvedPuzzleRecord) {
		let _guard = self.write_lock.lock().await;
		let mut entries = self.read_entries().await;

		if entries.len() >= ROTATE_AT {
			let archive_path = format!("{}.{}.archive.json", self.path, Utc::now().timestamp());
			if let Err(e) = tokio::fs::rename(&self.path, &archive_path).await {
				log::warn!("audit log rotation failed: {}", e);
			}
			entries.clear();
		}

		entries.push(record);
		match serde_json::to_string(&entries) {
			Ok(json) => {
				if let Err(e) = tokio::fs::write(&self.path, json).await {
					log::warn!("audit log write failed: {}", e);
				}
			}
			Err(e) => log::warn!("audit log serialization failed: {}", e),
		}
	}

	async fn read_entries(&self) -> Vec<SolvedPuzzleRecord> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
			Err(_) => Vec::new(),
		}
	}

	/// Reads the current file, and -- if it holds fewer than `min_len`
	/// records -- prepends the most recent rotated archive's records ahead
	/// of them (spec 4.2 warm-start: "read up to the last 1000 records of
	/// the newest audit log file, current or, if short, the most recent
	/// rotated archive").
	async fn read_entries_with_archive_fallback(&self, min_len: usize) -> Vec<SolvedPuzzleRecord> {
		let current = self.read_entries().await;
		if current.len() >= min_len {
			return current;
		}
		let Some(archive_path) = self.latest_archive_path().await else {
			return current;
		};
		let mut entries = match tokio::fs::read_to_string(&archive_path).await {
			Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
			Err(_) => Vec::new(),
		};
		entries.extend(current);
		entries
	}

	/// Finds `{path}.<unix timestamp>.archive.json` with the greatest
	/// timestamp in the audit log's directory, i.e. the archive created by
	/// the most recent rotation (spec 9 rotate-at-1000 scheme).
	async fn latest_archive_path(&self) -> Option<PathBuf> {
		let path = Path::new(&self.path);
		let file_name = path.file_name()?.to_string_lossy().into_owned();
		let dir = match path.parent() {
			Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
			_ => PathBuf::from("."),
		};
		let prefix = format!("{}.", file_name);
		const SUFFIX: &str = ".archive.json";

		let mut read_dir = tokio::fs::read_dir(&dir).await.ok()?;
		let mut best: Option<(i64, PathBuf)> = None;
		while let Ok(Some(entry)) = read_dir.next_entry().await {
			let name = entry.file_name().to_string_lossy().into_owned();
			let Some(timestamp_str) = name.strip_prefix(&prefix).and_then(|rest| rest.strip_suffix(SUFFIX)) else {
				continue;
			};
			let Ok(timestamp) = timestamp_str.parse::<i64>() else {
				continue;
			};
			let is_newer = match &best {
				Some((best_ts, _)) => timestamp > *best_ts,
				None => true,
			};
			if is_newer {
				best = Some((timestamp, entry.path()));
			}
		}
		best.map(|(_, archive_path)| archive_path)
	}

	/// Replays up to `n` most recent solve times, oldest first, to
	/// warm-start the Difficulty Controller's EMA on startup (spec 4.2).
	/// Reaches into the most recent rotated archive when the current file
	/// alone holds fewer than `n` records (spec 9, section 10.5).
	pub async fn recent_solve_times(&self, n: usize) -> Vec<f64> {
		let entries = self.read_entries_with_archive_fallback(n).await;
		let start = entries.len().saturating_sub(n);
		entries[start..].iter().map(|e| e.solve_time).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn appends_and_replays_recent_solve_times() {
		let dir = std::env::temp_dir();
		let path = dir.join(format!("hashpass-audit-test-{}.json", rand::random::<u64>()));
		let log = AuditLog::new(path.to_string_lossy().to_string());

		for i in 0..3 {
			log.append(SolvedPuzzleRecord {
				seed: "seed".into(),
				difficulty: 10,
				solve_time: i as f64,
				visitor_id: "v".into(),
				nonce: i,
				invite_code: "abc".into(),
				timestamp: i as i64,
			})
			.await;
		}

		let recent = log.recent_solve_times(2).await;
		assert_eq!(recent, vec![1.0, 2.0]);

		let _ = tokio::fs::remove_file(&path).await;
	}

	#[tokio::test]
	async fn falls_back_to_the_latest_archive_when_the_current_file_is_short() {
		let dir = std::env::temp_dir();
		let path = dir.join(format!("hashpass-audit-archive-test-{}.json", rand::random::<u64>()));
		let log = AuditLog::new(path.to_string_lossy().to_string());

		let older_archive = dir.join(format!("{}.1000.archive.json", path.to_string_lossy()));
		let newer_archive = dir.join(format!("{}.2000.archive.json", path.to_string_lossy()));
		let archive_record = |solve_time: f64| SolvedPuzzleRecord {
			seed: "seed".into(),
			difficulty: 10,
			solve_time,
			visitor_id: "v".into(),
			nonce: 0,
			invite_code: "abc".into(),
			timestamp: 0,
		};
		tokio::fs::write(
			&older_archive,
			serde_json::to_string(&vec![archive_record(100.0)]).unwrap(),
		)
		.await
		.unwrap();
		tokio::fs::write(
			&newer_archive,
			serde_json::to_string(&vec![archive_record(10.0), archive_record(20.0)]).unwrap(),
		)
		.await
		.unwrap();

		log.append(SolvedPuzzleRecord {
			seed: "seed".into(),
			difficulty: 10,
			solve_time: 30.0,
			visitor_id: "v".into(),
			nonce: 0,
			invite_code: "abc".into(),
			timestamp: 0,
		})
		.await;

		let recent = log.recent_solve_times(5).await;
		assert_eq!(recent, vec![10.0, 20.0, 30.0]);

		let _ = tokio::fs::remove_file(&path).await;
		let _ = tokio::fs::remove_file(&older_archive).await;
		let _ = tokio::fs::remove_file(&newer_archive).await;
	}
}
