// crates.io
use clap::Parser;
// self
use herald_resolve::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	herald_resolve::run(args).await
}
