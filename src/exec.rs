use std::convert::Infallible;
use std::ffi;
use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, ForkResult};
use thiserror::Error;

use crate::reap::{self, StageStatus};
use crate::redirect::{self, OpenError};
use crate::types::{Pipeline, Stage};

#[derive(Debug, Error)]
pub enum OrchestratorError {
	#[error("cannot create pipe: {0}")]
	PipeFailed(Errno),
	#[error("cannot fork: {0}")]
	ForkFailed(Errno),
}

#[derive(Debug, Error)]
enum StageError {
	#[error("{0}")]
	Redirect(#[from] OpenError),
	#[error("cannot rebind standard streams: {0}")]
	Wire(Errno),
	#[error("invalid argument: {0}")]
	BadName(#[from] ffi::NulError),
	#[error("{program}: command not found")]
	NotFound { program: String },
	#[error("{program}: {errno}")]
	Exec { program: String, errno: Errno },
}

impl StageError {
	fn exit_code(&self) -> i32 {
		match self {
			StageError::Redirect(OpenError::Bind { .. }) | StageError::Wire(_) => 2,
			StageError::Redirect(_) => 1,
			StageError::BadName(_) | StageError::Exec { .. } => 126,
			StageError::NotFound { .. } => 127,
		}
	}
}

struct PipeLink {
	read: OwnedFd,
	write: OwnedFd,
}

impl PipeLink {
	fn new() -> Result<PipeLink, OrchestratorError> {
		let (read, write) = unistd::pipe().map_err(OrchestratorError::PipeFailed)?;
		Ok(PipeLink { read, write })
	}
}

pub fn run(pipeline: &Pipeline) -> Result<Vec<StageStatus>, OrchestratorError> {
	let stages = &pipeline.stages;
	assert!(!stages.is_empty());

	let mut pids = Vec::with_capacity(stages.len());
	let mut prev_read: Option<OwnedFd> = None;

	for (i, stage) in stages.iter().enumerate() {
		let link = if i + 1 < stages.len() {
			match PipeLink::new() {
				Ok(link) => Some(link),
				Err(e) => {
					// close our ends first so the spawned stages can run to EOF
					drop(prev_read);
					reap::await_all(&pids);
					return Err(e);
				},
			}
		} else {
			None
		};

		match unsafe { unistd::fork() } {
			Ok(ForkResult::Child) => {
				let stdin_fd = prev_read.take();
				let stdout_fd = link.map(|l| { drop(l.read); l.write });
				let err = match wire_stage(stage, stdin_fd, stdout_fd) {
					Ok(never) => match never {},
					Err(e) => e,
				};
				eprintln!("psh: {err}");
				unsafe{ libc::_exit(err.exit_code()) }
			},
			Ok(ForkResult::Parent { child }) => {
				pids.push(child);
				prev_read = link.map(|l| l.read);
			},
			Err(errno) => {
				drop(link);
				drop(prev_read);
				reap::await_all(&pids);
				return Err(OrchestratorError::ForkFailed(errno));
			},
		}
	}

	Ok(reap::await_all(&pids))
}

fn wire_stage(
	stage: &Stage,
	stdin_fd: Option<OwnedFd>,
	stdout_fd: Option<OwnedFd>,
) -> Result<Infallible, StageError> {
	if let Some(fd) = stdout_fd {
		unistd::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO).map_err(StageError::Wire)?;
	}
	if let Some(fd) = stdin_fd {
		unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO).map_err(StageError::Wire)?;
	}
	// a redirection wins over the pipe endpoint on the same stream
	if let Some(redirect) = &stage.input {
		redirect::apply(redirect)?;
	}
	if let Some(redirect) = &stage.output {
		redirect::apply(redirect)?;
	}
	// the Rust runtime starts with SIGPIPE ignored; exec'd programs expect the default
	unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) }.map_err(StageError::Wire)?;
	let argv: Result<Vec<CString>, ffi::NulError> =
		stage.argv.iter().map(|a| CString::new(a.as_str())).collect();
	let argv = argv?;
	unistd::execvp(&argv[0], &argv).map_err(|errno| match errno {
		Errno::ENOENT => StageError::NotFound { program: stage.program().to_owned() },
		errno => StageError::Exec { program: stage.program().to_owned(), errno },
	})?;
	unreachable!()
}
