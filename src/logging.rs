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

//! Logging setup, adapted from the teacher's `grin_util::logger`: a
//! `LoggingConfig` describing stdout/file sinks and levels, installed once
//! via log4rs at startup.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as Log4rsConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

const LOGGING_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} {M} - {m}{n}";

#[derive(Clone, Debug)]
pub struct LoggingConfig {
	pub log_to_stdout: bool,
	pub stdout_level: LevelFilter,
	pub log_to_file: bool,
	pub file_level: LevelFilter,
	pub log_file_path: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		LoggingConfig {
			log_to_stdout: true,
			stdout_level: LevelFilter::Info,
			log_to_file: false,
			file_level: LevelFilter::Debug,
			log_file_path: "hashpass.log".to_string(),
		}
	}
}

/// Installs the global logger. Safe to call once; a second call is a no-op
/// (log4rs returns an error on double-init, which we swallow since test
/// binaries may call this more than once).
pub fn init(config: &LoggingConfig) {
	let mut root = Root::builder();
	let mut builder = Log4rsConfig::builder();

	if config.log_to_stdout {
		let stdout = ConsoleAppender::builder()
			.encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
			.build();
		builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
		root = root.appender("stdout");
	}

	if config.log_to_file {
		if let Ok(file) = FileAppender::builder()
			.encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
			.build(&config.log_file_path)
		{
			builder = builder.appender(Appender::builder().build("file", Box::new(file)));
			root = root.appender("file");
		}
	}

	let level = std::cmp::max(config.stdout_level, config.file_level);
	if let Ok(cfg) = builder.build(root.build(level)) {
		let _ = log4rs::init_config(cfg);
	}
}
