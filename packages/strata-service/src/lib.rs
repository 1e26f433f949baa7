pub mod access;
pub mod admin;
pub mod cache;
pub mod context;
pub mod entries;
pub mod permissions;
pub mod query;
pub mod rate_limit;
pub mod relations;
pub mod scopes;
pub mod tags;
pub mod time_serde;

mod error;

pub use error::{Error, Result};

use std::sync::Arc;

use strata_providers::{Classifier, Embedder, HttpClassifier, HttpEmbedder, HttpReranker, HttpSummarizer, Reranker, Summarizer};
use strata_storage::db::Db;

/// The four injected capabilities the query pipeline and context aggregator draw on. Built once at
/// startup from `strata_config::Providers` and shared across every request.
#[derive(Clone)]
pub struct Providers {
	pub embedder: Arc<dyn Embedder>,
	pub reranker: Arc<dyn Reranker>,
	pub classifier: Arc<dyn Classifier>,
	pub summarizer: Arc<dyn Summarizer>,
}

impl Providers {
	pub fn new(
		embedder: Arc<dyn Embedder>,
		reranker: Arc<dyn Reranker>,
		classifier: Arc<dyn Classifier>,
		summarizer: Arc<dyn Summarizer>,
	) -> Self {
		Self { embedder, reranker, classifier, summarizer }
	}

	/// Builds the HTTP-backed implementations of each capability from config, the wiring used by
	/// every real deployment; tests inject fakes via [`Providers::new`] instead.
	pub fn from_config(cfg: &strata_config::Providers) -> Self {
		Self {
			embedder: Arc::new(HttpEmbedder(cfg.embedder.clone())),
			reranker: Arc::new(HttpReranker(cfg.reranker.clone())),
			classifier: Arc::new(HttpClassifier(cfg.classifier.clone())),
			summarizer: Arc::new(HttpSummarizer(cfg.summarizer.clone())),
		}
	}
}

/// The core engine: storage handle, validated config, and injected capabilities. Every handler
/// module in this crate takes a `&StrataService` plus its own request type.
pub struct StrataService {
	pub cfg: strata_config::Config,
	pub db: Db,
	pub providers: Providers,
	pub cache: cache::QueryCache,
	pub rate_limiter: rate_limit::RateLimiter,
}

impl StrataService {
	pub fn new(cfg: strata_config::Config, db: Db) -> Self {
		let providers = Providers::from_config(&cfg.providers);
		let cache = cache::QueryCache::new(cfg.cache.capacity as usize, cfg.cache.ttl_seconds);
		let rate_limiter = rate_limit::RateLimiter::new(&cfg.security.rate_limit);

		Self { cfg, db, providers, cache, rate_limiter }
	}

	pub fn with_providers(cfg: strata_config::Config, db: Db, providers: Providers) -> Self {
		let cache = cache::QueryCache::new(cfg.cache.capacity as usize, cfg.cache.ttl_seconds);
		let rate_limiter = rate_limit::RateLimiter::new(&cfg.security.rate_limit);

		Self { cfg, db, providers, cache, rate_limiter }
	}
}
