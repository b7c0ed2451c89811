use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use tracing::warn;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StageStatus {
	pub pid: Pid,
	pub status: WaitStatus,
}

impl StageStatus {
	pub fn exit_code(&self) -> i32 {
		match self.status {
			WaitStatus::Exited(_, code) => code,
			WaitStatus::Signaled(_, sig, _) => 128 + sig as i32,
			_ => 0,
		}
	}
}

pub fn await_all(pids: &[Pid]) -> Vec<StageStatus> {
	pids.iter()
		.map(|&pid| {
			let status = loop {
				match waitpid(pid, None) {
					Ok(status) => break status,
					Err(Errno::EINTR) => continue,
					Err(errno) => {
						warn!(%pid, %errno, "waitpid failed");
						break WaitStatus::StillAlive;
					},
				}
			};
			StageStatus { pid, status }
		})
		.collect()
}
