pub mod server;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use strata_service::StrataService;
use strata_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = strata_cli::VERSION,
	rename_all = "kebab",
	styles = strata_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = strata_config::load(&args.config)?;
	let filter = EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;
	db.ensure_schema(config.storage.postgres.vector_dim).await?;

	let mcp_bind = config.service.mcp_bind.clone();
	let service = Arc::new(StrataService::new(config, db));

	server::serve_mcp(&mcp_bind, service).await
}
