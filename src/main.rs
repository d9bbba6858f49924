mod ui;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

use one_thing::config::load_config;
use one_thing::domain::format_last_done;
use one_thing::paths::{config_path, log_path, resolve_data_dir};
use one_thing::selector::pick_next;
use one_thing::{FileStore, OneThing, Session};

use crate::ui::run_home;

#[derive(Debug, Parser)]
#[command(name = "one-thing", about = "Do one small thing")]
struct Cli {
	#[arg(long)]
	data_dir: Option<PathBuf>,
	#[arg(long)]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Ui,
	List,
	Add {
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "")]
		icon: String,
	},
	Enable {
		#[arg(long)]
		id: String,
	},
	Disable {
		#[arg(long)]
		id: String,
	},
	Remove {
		#[arg(long)]
		id: String,
	},
	History {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
	Pick,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let data_dir = resolve_data_dir(cli.data_dir);
	init_logging(&data_dir);

	let config = load_config(&config_path(&data_dir, cli.config))?;
	let session = Session::new(config.reset_delay()).with_celebrations(config.celebrations.clone());
	let mut app = OneThing::open(FileStore::new(&data_dir), session)?;

	match cli.command.unwrap_or(Command::Ui) {
		Command::Ui => {
			run_home(&mut app, &config)?;
		}
		Command::List => {
			print_tasks(&app);
		}
		Command::Add { title, icon } => {
			let task = app.add_task(&title, &icon)?;
			println!("created task {} {}", task.id, task.label());
		}
		Command::Enable { id } => {
			app.set_task_active(&id, true)?;
			println!("enabled {id}");
		}
		Command::Disable { id } => {
			app.set_task_active(&id, false)?;
			println!("disabled {id}");
		}
		Command::Remove { id } => match app.remove_task(&id)? {
			Some(task) => println!("removed {}", task.label()),
			None => println!("no task with id {id}"),
		},
		Command::History { limit } => {
			print_history(&app, limit);
		}
		Command::Pick => match pick_next(app.tasks(), None, &mut thread_rng()) {
			Some(task) => println!("{}", task.label()),
			None => println!("no active tasks"),
		},
	}

	Ok(())
}

fn init_logging(data_dir: &Path) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

	// The terminal belongs to the UI, so logs go to a file in the data dir.
	let file = fs::create_dir_all(data_dir)
		.and_then(|()| {
			fs::OpenOptions::new()
				.create(true)
				.append(true)
				.open(log_path(data_dir))
		});

	match file {
		Ok(file) => {
			tracing_subscriber::fmt()
				.with_env_filter(filter)
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.init();
		}
		Err(err) => {
			eprintln!("warning: logging disabled: {err}");
		}
	}
}

fn print_tasks(app: &OneThing<FileStore>) {
	if app.tasks().is_empty() {
		println!("no tasks yet");
		return;
	}

	let now = Utc::now();
	for task in app.tasks() {
		let state = if task.is_active { "on " } else { "off" };
		let last_done = app
			.last_completed_at(&task.id)
			.map(|at| format_last_done(at, now))
			.unwrap_or_else(|| "never".to_string());
		println!("{} | {} | {} | {}", task.id, state, task.label(), last_done);
	}
}

fn print_history(app: &OneThing<FileStore>, limit: usize) {
	let rows = app.recent_logs(limit);
	if rows.is_empty() {
		println!("nothing completed yet");
		return;
	}

	let now = Utc::now();
	for log in rows {
		let label = app
			.task(&log.task_id)
			.map(|task| task.label())
			.unwrap_or_else(|| "(deleted task)".to_string());
		println!("{} | {}", format_last_done(log.completed_at, now), label);
	}
}
