use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

const APP_DIR: &str = "one_thing";
const LOG_FILE: &str = "one-thing.log";

pub fn resolve_data_dir(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return absolutize(path);
	}

	if let Some(path) = env::var_os("ONE_THING_DATA_DIR") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return absolutize(path);
		}
	}

	default_data_dir()
}

pub fn config_path(data_dir: &Path, cli_path: Option<PathBuf>) -> PathBuf {
	cli_path
		.map(absolutize)
		.unwrap_or_else(|| data_dir.join(CONFIG_FILE))
}

pub fn log_path(data_dir: &Path) -> PathBuf {
	data_dir.join(LOG_FILE)
}

fn default_data_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_DATA_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("share")
			.join(APP_DIR);
	}

	PathBuf::from(".one_thing")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
