use std::io::{self, BufRead, IsTerminal};
use std::process;

use anyhow::Context;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use psh::exec;
use psh::parser::{self, Line};
use psh::reap::StageStatus;

const PROMPT: &str = "psh> ";

#[derive(Parser, Debug)]
#[command(name = "psh", version, about = "Run a pipeline of commands")]
struct Args {
	/// Run a single command line and exit with its status
	#[arg(short, long)]
	command: Option<String>,
}

enum Flow {
	Continue(i32),
	Exit,
}

impl Flow {
	fn code(self) -> i32 {
		match self {
			Flow::Continue(code) => code,
			Flow::Exit => 0,
		}
	}
}

fn main() {
	let args = Args::parse();
	init_tracing();
	let code = match run_shell(args) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("psh: {e:#}");
			1
		},
	};
	process::exit(code);
}

fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(io::stderr)
		.init();
}

fn run_shell(args: Args) -> anyhow::Result<i32> {
	match args.command {
		Some(line) => Ok(eval_line(&line).code()),
		None if io::stdin().is_terminal() => interactive(),
		None => batch(),
	}
}

fn interactive() -> anyhow::Result<i32> {
	let mut editor = DefaultEditor::new().context("cannot initialize line editor")?;
	loop {
		match editor.readline(PROMPT) {
			Ok(line) => {
				if !line.trim().is_empty() {
					let _ = editor.add_history_entry(&line);
				}
				if let Flow::Exit = eval_line(&line) {
					return Ok(0);
				}
			},
			Err(ReadlineError::Interrupted) => continue,
			Err(ReadlineError::Eof) => return Ok(0),
			Err(e) => return Err(e).context("cannot read input line"),
		}
	}
}

fn batch() -> anyhow::Result<i32> {
	let stdin = io::stdin();
	for line in stdin.lock().lines() {
		let line = line.context("cannot read input line")?;
		if let Flow::Exit = eval_line(&line) {
			return Ok(0);
		}
	}
	Ok(0)
}

fn eval_line(line: &str) -> Flow {
	let pipeline = match parser::parse(line) {
		Ok(Line::Empty) => return Flow::Continue(0),
		Ok(Line::Exit) => return Flow::Exit,
		Ok(Line::Pipeline(pipeline)) => pipeline,
		Err(e) => {
			eprintln!("psh: {e}");
			return Flow::Continue(2);
		},
	};
	debug!(stages = pipeline.stages.len(), "spawning pipeline");
	match exec::run(&pipeline) {
		Ok(statuses) => Flow::Continue(statuses.last().map_or(0, StageStatus::exit_code)),
		Err(e) => {
			eprintln!("psh: {e}");
			Flow::Continue(1)
		},
	}
}
