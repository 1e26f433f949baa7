use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub prioritization: Prioritization,
	pub cache: Cache,
	pub security: Security,
	pub embedding_queue: EmbeddingQueue,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub mcp_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedder: ProviderConfig,
	pub reranker: ProviderConfig,
	pub classifier: ProviderConfig,
	pub summarizer: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub hybrid_alpha: f32,
	pub rerank_alpha: f32,
	pub rerank_top_k: u32,
	pub hyde_enabled: bool,
	pub default_limit: u32,
	pub max_limit: u32,
	pub coverage_bonus: f32,
}

#[derive(Debug, Deserialize)]
pub struct Prioritization {
	pub weights: PriorityWeights,
	pub adaptive: AdaptiveConfig,
	pub usefulness: UsefulnessConfig,
	pub context_boost: ContextBoostConfig,
}

#[derive(Debug, Deserialize)]
pub struct PriorityWeights {
	pub adaptive_weight: f32,
	pub usefulness: f32,
	pub context_boost: f32,
}

#[derive(Debug, Deserialize)]
pub struct AdaptiveConfig {
	pub min_samples: u32,
	pub confidence_span: f32,
	pub learning_rate: f32,
	pub baselines: BTreeMap<String, f32>,
}

#[derive(Debug, Deserialize)]
pub struct UsefulnessConfig {
	pub volume_confidence_weight: f32,
	pub success_rate_weight: f32,
	pub recency_weight: f32,
	pub recency_tau_days: f32,
	pub min_retrievals_for_signal: u32,
}

#[derive(Debug, Deserialize)]
pub struct ContextBoostConfig {
	pub beta: f32,
	pub boost_multiplier: f32,
	pub exemplar_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	pub capacity: u32,
	pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub cursor_secret: String,
	pub cursor_ttl_seconds: i64,
	pub rate_limit: RateLimit,
	pub permission_mode: String,
	#[serde(default)]
	pub admin_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
	pub window_seconds: i64,
	pub max_requests_per_agent: u32,
	pub max_requests_global: u32,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingQueue {
	pub concurrency: u32,
	pub max_queue_length: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
	pub max_attempts: u32,
	pub claim_lease_seconds: i64,
	pub poll_interval_ms: u64,
}
