use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use nix::errno::Errno;
use nix::unistd;
use thiserror::Error;

use crate::types::{Redirect, RedirectMode};

const CREATE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum OpenError {
	#[error("{path}: no such file or directory")]
	NotFound { path: String },
	#[error("{path}: permission denied")]
	PermissionDenied { path: String },
	#[error("{path}: {source}")]
	Other { path: String, source: io::Error },
	#[error("{path}: cannot bind stream: {source}")]
	Bind { path: String, source: Errno },
}

pub fn apply(redirect: &Redirect) -> Result<(), OpenError> {
	let mut options = OpenOptions::new();
	let target_fd = match redirect.mode {
		RedirectMode::Read => {
			options.read(true);
			libc::STDIN_FILENO
		},
		RedirectMode::Truncate => {
			options.write(true).create(true).truncate(true).mode(CREATE_MODE);
			libc::STDOUT_FILENO
		},
		RedirectMode::Append => {
			options.append(true).create(true).mode(CREATE_MODE);
			libc::STDOUT_FILENO
		},
	};
	let file = options.open(&redirect.path).map_err(|e| classify(&redirect.path, e))?;
	unistd::dup2(file.as_raw_fd(), target_fd)
		.map_err(|errno| OpenError::Bind { path: redirect.path.clone(), source: errno })?;
	Ok(())
}

fn classify(path: &str, e: io::Error) -> OpenError {
	match e.kind() {
		io::ErrorKind::NotFound => OpenError::NotFound { path: path.to_owned() },
		io::ErrorKind::PermissionDenied => OpenError::PermissionDenied { path: path.to_owned() },
		_ => OpenError::Other { path: path.to_owned(), source: e },
	}
}
