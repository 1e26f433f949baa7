use clap::Parser;

use strata_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	strata_mcp::run(args).await
}
