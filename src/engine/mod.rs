//! Engine module: command-line front-end around the import pipeline

pub mod arg_parser;
pub mod cli;
pub mod progress;

pub use arg_parser::Cli;
pub use cli::{apply_cli_to_opts, error_log_path, handle_run, setup_opts};
