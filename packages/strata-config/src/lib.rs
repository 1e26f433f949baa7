mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AdaptiveConfig, Cache, Config, ContextBoostConfig, EmbeddingQueue, Postgres, PriorityWeights,
	Prioritization, ProviderConfig, Providers, RateLimit, Search, Security, Service, Storage,
	UsefulnessConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	validate_service(cfg)?;
	validate_providers(cfg)?;
	validate_search(cfg)?;
	validate_prioritization(cfg)?;
	validate_cache(cfg)?;
	validate_security(cfg)?;
	validate_embedding_queue(cfg)?;

	Ok(())
}

fn validate_service(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("service.mcp_bind", &cfg.service.mcp_bind),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	Ok(())
}

fn validate_providers(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.vector_dim must be greater than zero.".to_string(),
		});
	}

	for (label, provider) in [
		("providers.embedder", &cfg.providers.embedder),
		("providers.reranker", &cfg.providers.reranker),
		("providers.classifier", &cfg.providers.classifier),
		("providers.summarizer", &cfg.providers.summarizer),
	] {
		if provider.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("{label}.api_base must be non-empty."),
			});
		}
		if provider.model.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label}.model must be non-empty.") });
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	for (path, value) in [
		("search.hybrid_alpha", cfg.search.hybrid_alpha),
		("search.rerank_alpha", cfg.search.rerank_alpha),
		("search.coverage_bonus", cfg.search.coverage_bonus),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{path} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{path} must be in the range 0.0-1.0."),
			});
		}
	}
	if cfg.search.rerank_top_k == 0 {
		return Err(Error::Validation {
			message: "search.rerank_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than or equal to search.default_limit."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_prioritization(cfg: &Config) -> Result<()> {
	let weights = &cfg.prioritization.weights;
	let total = weights.adaptive_weight + weights.usefulness + weights.context_boost;

	if !(weights.adaptive_weight.is_finite()
		&& weights.usefulness.is_finite()
		&& weights.context_boost.is_finite())
	{
		return Err(Error::Validation {
			message: "prioritization.weights.* must be finite numbers.".to_string(),
		});
	}
	if (total - 1.0).abs() > 1e-3 {
		return Err(Error::Validation {
			message: format!(
				"prioritization.weights must sum to 1.0, got {total} (adaptive_weight + usefulness + context_boost)."
			),
		});
	}

	let adaptive = &cfg.prioritization.adaptive;

	if adaptive.min_samples == 0 {
		return Err(Error::Validation {
			message: "prioritization.adaptive.min_samples must be greater than zero.".to_string(),
		});
	}
	if adaptive.confidence_span <= 0.0 {
		return Err(Error::Validation {
			message: "prioritization.adaptive.confidence_span must be greater than zero."
				.to_string(),
		});
	}
	if adaptive.baselines.is_empty() {
		return Err(Error::Validation {
			message: "prioritization.adaptive.baselines must be non-empty.".to_string(),
		});
	}
	for (intent, weight) in &adaptive.baselines {
		if !(0.5..=2.0).contains(weight) {
			return Err(Error::Validation {
				message: format!(
					"prioritization.adaptive.baselines.{intent} must be in the range 0.5-2.0."
				),
			});
		}
	}

	let usefulness = &cfg.prioritization.usefulness;
	let usefulness_total = usefulness.volume_confidence_weight
		+ usefulness.success_rate_weight
		+ usefulness.recency_weight;

	if (usefulness_total - 1.0).abs() > 1e-3 {
		return Err(Error::Validation {
			message: format!(
				"prioritization.usefulness weights must sum to 1.0, got {usefulness_total}."
			),
		});
	}
	if usefulness.recency_tau_days <= 0.0 {
		return Err(Error::Validation {
			message: "prioritization.usefulness.recency_tau_days must be greater than zero."
				.to_string(),
		});
	}

	let context_boost = &cfg.prioritization.context_boost;

	if context_boost.boost_multiplier < 1.0 {
		return Err(Error::Validation {
			message: "prioritization.context_boost.boost_multiplier must be 1.0 or greater."
				.to_string(),
		});
	}
	if context_boost.exemplar_count == 0 {
		return Err(Error::Validation {
			message: "prioritization.context_boost.exemplar_count must be greater than zero."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_cache(cfg: &Config) -> Result<()> {
	if cfg.cache.capacity == 0 {
		return Err(Error::Validation {
			message: "cache.capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.ttl_seconds <= 0 {
		return Err(Error::Validation {
			message: "cache.ttl_seconds must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_security(cfg: &Config) -> Result<()> {
	if cfg.security.cursor_secret.trim().len() < 16 {
		return Err(Error::Validation {
			message: "security.cursor_secret must be at least 16 characters.".to_string(),
		});
	}
	if cfg.security.cursor_ttl_seconds <= 0 {
		return Err(Error::Validation {
			message: "security.cursor_ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.security.permission_mode.as_str(), "enforced" | "permissive") {
		return Err(Error::Validation {
			message: "security.permission_mode must be one of enforced or permissive.".to_string(),
		});
	}
	if cfg.security.permission_mode == "enforced"
		&& cfg.security.admin_key.as_deref().unwrap_or("").trim().is_empty()
	{
		return Err(Error::Validation {
			message: "security.admin_key must be set when security.permission_mode is enforced."
				.to_string(),
		});
	}
	if cfg.security.rate_limit.window_seconds <= 0 {
		return Err(Error::Validation {
			message: "security.rate_limit.window_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.security.rate_limit.max_requests_per_agent == 0 {
		return Err(Error::Validation {
			message: "security.rate_limit.max_requests_per_agent must be greater than zero."
				.to_string(),
		});
	}
	if cfg.security.rate_limit.max_requests_global < cfg.security.rate_limit.max_requests_per_agent
	{
		return Err(Error::Validation {
			message: "security.rate_limit.max_requests_global must be at least max_requests_per_agent."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_embedding_queue(cfg: &Config) -> Result<()> {
	let queue = &cfg.embedding_queue;

	if queue.concurrency == 0 {
		return Err(Error::Validation {
			message: "embedding_queue.concurrency must be greater than zero.".to_string(),
		});
	}
	if queue.max_queue_length == 0 {
		return Err(Error::Validation {
			message: "embedding_queue.max_queue_length must be greater than zero.".to_string(),
		});
	}
	if queue.base_backoff_ms == 0 {
		return Err(Error::Validation {
			message: "embedding_queue.base_backoff_ms must be greater than zero.".to_string(),
		});
	}
	if queue.max_backoff_ms < queue.base_backoff_ms {
		return Err(Error::Validation {
			message: "embedding_queue.max_backoff_ms must be at least base_backoff_ms.".to_string(),
		});
	}
	if queue.max_attempts == 0 {
		return Err(Error::Validation {
			message: "embedding_queue.max_attempts must be greater than zero.".to_string(),
		});
	}
	if queue.claim_lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "embedding_queue.claim_lease_seconds must be greater than zero.".to_string(),
		});
	}
	if queue.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "embedding_queue.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}
