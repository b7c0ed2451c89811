#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectMode { Read, Truncate, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub path: String,
	pub mode: RedirectMode,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	pub argv: Vec<String>,
	pub input: Option<Redirect>,
	pub output: Option<Redirect>,
}

impl Stage {
	pub fn program(&self) -> &str {
		&self.argv[0]
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}
