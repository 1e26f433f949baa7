use std::sync::Arc;

use async_trait::async_trait;
use strata_config::{
	AdaptiveConfig, Cache, Config, ContextBoostConfig, EmbeddingQueue, PriorityWeights, Prioritization,
	ProviderConfig, Providers as ProviderConfigs, Postgres, RateLimit, Search, Security, Service, Storage,
	UsefulnessConfig,
};
use strata_providers::{Classifier, Embedder, Reranker, Summarizer};
use strata_service::{Providers, StrataService};
use strata_storage::db::Db;
use strata_testkit::TestDatabase;

pub struct StubEmbedder {
	pub vector_dim: u32,
}

#[async_trait]
impl Embedder for StubEmbedder {
	async fn embed(&self, texts: &[String]) -> color_eyre::Result<Vec<Vec<f32>>> {
		let dim = self.vector_dim as usize;

		Ok(texts.iter().map(|text| deterministic_vector(text, dim)).collect())
	}
}

/// Hashes each text into a unit-ish vector so related content lands close in cosine space without
/// pulling in a real embedding model for tests.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
	let hash = blake3::hash(text.as_bytes());
	let bytes = hash.as_bytes();

	(0..dim).map(|i| (bytes[i % bytes.len()] as f32 / 255.0) - 0.5).collect()
}

pub struct StubReranker;

#[async_trait]
impl Reranker for StubReranker {
	async fn rerank(&self, _query: &str, docs: &[String]) -> color_eyre::Result<Vec<f32>> {
		Ok(docs.iter().map(|_| 0.5).collect())
	}
}

pub struct StubClassifier;

#[async_trait]
impl Classifier for StubClassifier {
	async fn classify(&self, _query: &str) -> color_eyre::Result<String> {
		Ok("general".to_string())
	}
}

pub struct StubSummarizer;

#[async_trait]
impl Summarizer for StubSummarizer {
	async fn summarize(&self, text: &str, max_words: u32) -> color_eyre::Result<String> {
		Ok(text.split_whitespace().take(max_words as usize).collect::<Vec<_>>().join(" "))
	}
}

pub fn dummy_provider() -> ProviderConfig {
	ProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "test-key".to_string(),
		path: "/".to_string(),
		model: "test".to_string(),
		timeout_ms: 1000,
		default_headers: Default::default(),
	}
}

pub fn test_config(dsn: String, vector_dim: u32) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			mcp_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 4, vector_dim } },
		providers: ProviderConfigs {
			embedder: dummy_provider(),
			reranker: dummy_provider(),
			classifier: dummy_provider(),
			summarizer: dummy_provider(),
		},
		search: Search {
			hybrid_alpha: 0.5,
			rerank_alpha: 0.3,
			rerank_top_k: 20,
			hyde_enabled: false,
			default_limit: 10,
			max_limit: 100,
			coverage_bonus: 0.05,
		},
		prioritization: Prioritization {
			weights: PriorityWeights { adaptive_weight: 0.3, usefulness: 0.3, context_boost: 0.4 },
			adaptive: AdaptiveConfig {
				min_samples: 5,
				confidence_span: 20.0,
				learning_rate: 0.1,
				baselines: Default::default(),
			},
			usefulness: UsefulnessConfig {
				volume_confidence_weight: 0.3,
				success_rate_weight: 0.5,
				recency_weight: 0.2,
				recency_tau_days: 30.0,
				min_retrievals_for_signal: 3,
			},
			context_boost: ContextBoostConfig { beta: 0.5, boost_multiplier: 1.0, exemplar_count: 3 },
		},
		cache: Cache { capacity: 256, ttl_seconds: 60 },
		security: Security {
			cursor_secret: "test-cursor-secret".to_string(),
			cursor_ttl_seconds: 300,
			rate_limit: RateLimit { window_seconds: 60, max_requests_per_agent: 1000, max_requests_global: 10_000 },
			permission_mode: "permissive".to_string(),
			admin_key: Some("test-admin-key".to_string()),
		},
		embedding_queue: EmbeddingQueue {
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

pub async fn test_db() -> Option<TestDatabase> {
	let base_dsn = strata_testkit::env_dsn()?;
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");

	Some(db)
}

pub async fn build_service(cfg: Config) -> color_eyre::Result<StrataService> {
	let db = Db::connect(&cfg.storage.postgres).await?;

	db.ensure_schema(cfg.storage.postgres.vector_dim).await?;

	let providers = Providers::new(
		Arc::new(StubEmbedder { vector_dim: cfg.storage.postgres.vector_dim }),
		Arc::new(StubReranker),
		Arc::new(StubClassifier),
		Arc::new(StubSummarizer),
	);

	Ok(StrataService::with_providers(cfg, db, providers))
}
