use clap::Parser;

use strata_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	strata_worker::run(args).await
}
