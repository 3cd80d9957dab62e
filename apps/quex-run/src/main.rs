// crates.io
use clap::Parser;
// self
use quex_run::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	quex_run::run(args).await
}
