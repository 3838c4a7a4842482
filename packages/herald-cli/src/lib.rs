use std::io;

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Logs go to stderr; stdout is reserved for command output.
pub fn init_tracing(log_level: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new(log_level))
		.with_writer(io::stderr)
		.init();
}
