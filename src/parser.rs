use thiserror::Error;

use crate::types::{Pipeline, Redirect, RedirectMode, Stage};

pub const MAX_LINE_LEN: usize = 4096;
pub const MAX_STAGE_ARGS: usize = 10;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Limits {
	pub max_line_len: usize,
	pub max_stage_args: usize,
}

impl Default for Limits {
	fn default() -> Limits {
		Limits { max_line_len: MAX_LINE_LEN, max_stage_args: MAX_STAGE_ARGS }
	}
}

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
	Empty,
	Exit,
	Pipeline(Pipeline),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
	#[error("line exceeds {limit} bytes")]
	LineTooLong { limit: usize },
	#[error("empty command between pipes")]
	EmptyStage,
	#[error("missing file name after '{op}'")]
	MissingRedirectTarget { op: &'static str },
	#[error("too many arguments (limit {limit})")]
	TooManyArguments { limit: usize },
}

pub fn parse(line: &str) -> Result<Line, ParseError> {
	parse_with(line, &Limits::default())
}

pub fn parse_with(line: &str, limits: &Limits) -> Result<Line, ParseError> {
	if line.len() > limits.max_line_len {
		return Err(ParseError::LineTooLong { limit: limits.max_line_len });
	}
	if line.trim().is_empty() {
		return Ok(Line::Empty);
	}

	let mut stages = Vec::new();
	for segment in line.split('|') {
		let tokens: Vec<&str> = segment.split_whitespace().collect();
		if tokens == ["exit"] {
			return Ok(Line::Exit);
		}
		stages.push(build_stage(&tokens, limits)?);
	}
	Ok(Line::Pipeline(Pipeline { stages }))
}

fn build_stage(tokens: &[&str], limits: &Limits) -> Result<Stage, ParseError> {
	let mut argv: Vec<String> = Vec::new();
	let mut input = None;
	let mut output = None;

	let mut iter = tokens.iter();
	while let Some(&token) = iter.next() {
		let (mode, op) = match token {
			"<" => (RedirectMode::Read, "<"),
			">" => (RedirectMode::Truncate, ">"),
			">>" => (RedirectMode::Append, ">>"),
			_ => {
				argv.push(token.to_owned());
				continue;
			},
		};
		let path = iter.next().ok_or(ParseError::MissingRedirectTarget { op })?;
		let redirect = Redirect { path: (*path).to_owned(), mode };
		match mode {
			RedirectMode::Read => input = Some(redirect),
			_ => output = Some(redirect),
		}
	}

	if argv.is_empty() {
		return Err(ParseError::EmptyStage);
	}
	if argv.len() > limits.max_stage_args {
		return Err(ParseError::TooManyArguments { limit: limits.max_stage_args });
	}
	Ok(Stage { argv, input, output })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parsed(line: &str) -> Pipeline {
		match parse(line) {
			Ok(Line::Pipeline(pipeline)) => pipeline,
			other => panic!("expected pipeline, got {:?}", other),
		}
	}

	fn argv(stage: &Stage) -> Vec<&str> {
		stage.argv.iter().map(String::as_str).collect()
	}

	#[test]
	fn single_command_with_arguments() {
		let pipeline = parsed("ls -l /tmp\n");
		assert_eq!(pipeline.stages.len(), 1);
		assert_eq!(argv(&pipeline.stages[0]), ["ls", "-l", "/tmp"]);
		assert_eq!(pipeline.stages[0].input, None);
		assert_eq!(pipeline.stages[0].output, None);
	}

	#[test]
	fn three_stages_keep_order() {
		let pipeline = parsed("cat f | sort -r | uniq\n");
		assert_eq!(pipeline.stages.len(), 3);
		assert_eq!(argv(&pipeline.stages[0]), ["cat", "f"]);
		assert_eq!(argv(&pipeline.stages[1]), ["sort", "-r"]);
		assert_eq!(argv(&pipeline.stages[2]), ["uniq"]);
	}

	#[test]
	fn blank_lines_are_empty() {
		assert_eq!(parse(""), Ok(Line::Empty));
		assert_eq!(parse("\n"), Ok(Line::Empty));
		assert_eq!(parse("   \t  \n"), Ok(Line::Empty));
	}

	#[test]
	fn exit_alone_requests_termination() {
		assert_eq!(parse("exit"), Ok(Line::Exit));
		assert_eq!(parse("  exit  \n"), Ok(Line::Exit));
	}

	#[test]
	fn exit_in_any_segment_requests_termination() {
		assert_eq!(parse("echo hi | exit\n"), Ok(Line::Exit));
		assert_eq!(parse("echo hi | exit | cat\n"), Ok(Line::Exit));
	}

	#[test]
	fn exit_with_arguments_is_an_ordinary_command() {
		let pipeline = parsed("exit 1\n");
		assert_eq!(argv(&pipeline.stages[0]), ["exit", "1"]);
	}

	#[test]
	fn empty_segment_before_exit_is_still_an_error() {
		assert_eq!(parse("| exit\n"), Err(ParseError::EmptyStage));
	}

	#[test]
	fn input_redirect_is_extracted_from_argv() {
		let pipeline = parsed("wc -l < data.txt\n");
		assert_eq!(argv(&pipeline.stages[0]), ["wc", "-l"]);
		assert_eq!(
			pipeline.stages[0].input,
			Some(Redirect { path: "data.txt".to_owned(), mode: RedirectMode::Read })
		);
	}

	#[test]
	fn output_and_append_redirects_are_extracted() {
		let truncated = parsed("echo hi > out.txt\n");
		assert_eq!(
			truncated.stages[0].output,
			Some(Redirect { path: "out.txt".to_owned(), mode: RedirectMode::Truncate })
		);
		let appended = parsed("echo hi >> out.txt\n");
		assert_eq!(
			appended.stages[0].output,
			Some(Redirect { path: "out.txt".to_owned(), mode: RedirectMode::Append })
		);
	}

	#[test]
	fn one_stage_can_carry_both_directives() {
		let pipeline = parsed("tr a-z A-Z < in.txt > out.txt\n");
		assert_eq!(argv(&pipeline.stages[0]), ["tr", "a-z", "A-Z"]);
		assert_eq!(
			pipeline.stages[0].input,
			Some(Redirect { path: "in.txt".to_owned(), mode: RedirectMode::Read })
		);
		assert_eq!(
			pipeline.stages[0].output,
			Some(Redirect { path: "out.txt".to_owned(), mode: RedirectMode::Truncate })
		);
	}

	#[test]
	fn arguments_after_a_redirect_still_belong_to_argv() {
		let pipeline = parsed("cat < in.txt -n\n");
		assert_eq!(argv(&pipeline.stages[0]), ["cat", "-n"]);
	}

	#[test]
	fn attached_redirect_is_a_plain_token() {
		let pipeline = parsed("echo >out.txt\n");
		assert_eq!(argv(&pipeline.stages[0]), ["echo", ">out.txt"]);
		assert_eq!(pipeline.stages[0].output, None);
	}

	#[test]
	fn later_redirect_replaces_earlier_one() {
		let pipeline = parsed("echo hi > a.txt >> b.txt\n");
		assert_eq!(
			pipeline.stages[0].output,
			Some(Redirect { path: "b.txt".to_owned(), mode: RedirectMode::Append })
		);
	}

	#[test]
	fn redirect_without_target_is_rejected() {
		assert_eq!(parse("cat <"), Err(ParseError::MissingRedirectTarget { op: "<" }));
		assert_eq!(parse("echo hi >"), Err(ParseError::MissingRedirectTarget { op: ">" }));
		assert_eq!(parse("echo hi >>\n"), Err(ParseError::MissingRedirectTarget { op: ">>" }));
	}

	#[test]
	fn empty_stages_are_rejected() {
		assert_eq!(parse("| cat\n"), Err(ParseError::EmptyStage));
		assert_eq!(parse("cat |\n"), Err(ParseError::EmptyStage));
		assert_eq!(parse("cat | | cat\n"), Err(ParseError::EmptyStage));
		assert_eq!(parse(" | \n"), Err(ParseError::EmptyStage));
		assert_eq!(parse("< in.txt\n"), Err(ParseError::EmptyStage));
	}

	#[test]
	fn argv_limit_counts_the_program_name() {
		let ten = "p a b c d e f g h i";
		assert!(matches!(parse(ten), Ok(Line::Pipeline(_))));
		let eleven = "p a b c d e f g h i j";
		assert_eq!(parse(eleven), Err(ParseError::TooManyArguments { limit: 10 }));
	}

	#[test]
	fn over_long_line_is_rejected_before_anything_else() {
		let line = "x".repeat(MAX_LINE_LEN);
		assert!(matches!(parse(&line), Ok(Line::Pipeline(_))));
		let line = "x".repeat(MAX_LINE_LEN + 1);
		assert_eq!(parse(&line), Err(ParseError::LineTooLong { limit: MAX_LINE_LEN }));
	}

	#[test]
	fn custom_limits_are_honored() {
		let limits = Limits { max_line_len: 8, max_stage_args: 2 };
		assert_eq!(
			parse_with("echo a b\n", &limits),
			Err(ParseError::LineTooLong { limit: 8 })
		);
		assert_eq!(
			parse_with("echo a b", &limits),
			Err(ParseError::TooManyArguments { limit: 2 })
		);
		assert!(matches!(parse_with("echo a", &limits), Ok(Line::Pipeline(_))));
	}
}
