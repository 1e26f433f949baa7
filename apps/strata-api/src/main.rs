use clap::Parser;

use strata_api::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	strata_api::run(args).await
}
