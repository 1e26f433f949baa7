use std::sync::Arc;

use rmcp::handler::server::tool::Parameters;
use strata_mcp::server::{AddEntryArgs, AdminStatusArgs, GetEntryArgs, StrataMcp};
use strata_service::StrataService;
use strata_storage::db::Db;

fn dummy_provider() -> strata_config::ProviderConfig {
	strata_config::ProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/".to_string(),
		model: "test".to_string(),
		timeout_ms: 1000,
		default_headers: Default::default(),
	}
}

fn test_config(dsn: String) -> strata_config::Config {
	strata_config::Config {
		service: strata_config::Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			mcp_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: strata_config::Storage {
			postgres: strata_config::Postgres { dsn, pool_max_conns: 4, vector_dim: 8 },
		},
		providers: strata_config::Providers {
			embedder: dummy_provider(),
			reranker: dummy_provider(),
			classifier: dummy_provider(),
			summarizer: dummy_provider(),
		},
		search: strata_config::Search {
			hybrid_alpha: 0.5,
			rerank_alpha: 0.3,
			rerank_top_k: 20,
			hyde_enabled: false,
			default_limit: 10,
			max_limit: 100,
			coverage_bonus: 0.05,
		},
		prioritization: strata_config::Prioritization {
			weights: strata_config::PriorityWeights { adaptive_weight: 0.3, usefulness: 0.3, context_boost: 0.4 },
			adaptive: strata_config::AdaptiveConfig {
				min_samples: 5,
				confidence_span: 20.0,
				learning_rate: 0.1,
				baselines: Default::default(),
			},
			usefulness: strata_config::UsefulnessConfig {
				volume_confidence_weight: 0.3,
				success_rate_weight: 0.5,
				recency_weight: 0.2,
				recency_tau_days: 30.0,
				min_retrievals_for_signal: 3,
			},
			context_boost: strata_config::ContextBoostConfig { beta: 0.5, boost_multiplier: 1.0, exemplar_count: 3 },
		},
		cache: strata_config::Cache { capacity: 256, ttl_seconds: 60 },
		security: strata_config::Security {
			cursor_secret: "test-cursor-secret".to_string(),
			cursor_ttl_seconds: 300,
			rate_limit: strata_config::RateLimit { window_seconds: 60, max_requests_per_agent: 1000, max_requests_global: 10_000 },
			permission_mode: "permissive".to_string(),
			admin_key: Some("test-admin-key".to_string()),
		},
		embedding_queue: strata_config::EmbeddingQueue {
			concurrency: 4,
			max_queue_length: 1000,
			base_backoff_ms: 100,
			max_backoff_ms: 5000,
			max_attempts: 5,
			claim_lease_seconds: 30,
			poll_interval_ms: 50,
		},
	}
}

async fn build_mcp(cfg: strata_config::Config) -> color_eyre::Result<StrataMcp> {
	let db = Db::connect(&cfg.storage.postgres).await?;
	db.ensure_schema(cfg.storage.postgres.vector_dim).await?;

	Ok(StrataMcp::new(Arc::new(StrataService::new(cfg, db))))
}

/// The `#[tool]` attribute leaves each method directly callable; this exercises the dispatch path
/// the same way `rmcp`'s router would, without standing up a real HTTP session.
#[tokio::test]
async fn add_entry_then_get_entry_round_trips() {
	let Some(base_dsn) = strata_testkit::env_dsn() else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let db = strata_testkit::TestDatabase::new(&base_dsn).await.expect("create test database");
	let cfg = test_config(db.dsn().to_string());
	let mcp = build_mcp(cfg).await.expect("build mcp server");

	let added = mcp
		.add_entry(Parameters(AddEntryArgs {
			agent_id: "agent-1".to_string(),
			kind: "knowledge".to_string(),
			scope_type: "global".to_string(),
			scope_id: None,
			name: "mcp-entry".to_string(),
			category: None,
			content: "hello over mcp".to_string(),
			rationale: None,
		}))
		.await
		.expect("call add_entry");

	assert_ne!(added.is_error, Some(true));

	let entry_id: uuid::Uuid = {
		let text = added.content.first().and_then(|c| c.as_text()).expect("text content").text.clone();
		let (id, _version_id, _version_num): (uuid::Uuid, uuid::Uuid, i32) =
			serde_json::from_str(&text).expect("parse add_entry result");
		id
	};

	let fetched = mcp.get_entry(Parameters(GetEntryArgs { entry_id })).await.expect("call get_entry");

	assert_ne!(fetched.is_error, Some(true));

	let name = fetched.content.first().and_then(|c| c.as_text()).expect("text content").text.clone();

	assert_eq!(name, "\"mcp-entry\"");

	db.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn admin_status_reports_zero_on_fresh_database() {
	let Some(base_dsn) = strata_testkit::env_dsn() else {
		eprintln!("skipping: STRATA_PG_DSN not set");
		return;
	};

	let db = strata_testkit::TestDatabase::new(&base_dsn).await.expect("create test database");
	let cfg = test_config(db.dsn().to_string());
	let mcp = build_mcp(cfg).await.expect("build mcp server");

	let status = mcp.admin_status(Parameters(AdminStatusArgs {})).await.expect("call admin_status");

	assert_ne!(status.is_error, Some(true));

	db.cleanup().await.expect("cleanup");
}
