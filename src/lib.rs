//! Parse a command line into pipeline stages and run them as cooperating processes.

pub mod types;
pub mod parser;
pub mod redirect;
pub mod exec;
pub mod reap;
