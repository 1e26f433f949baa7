use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, StrataService};

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
	pub include: Vec<String>,
	pub require: Vec<String>,
	pub exclude: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RelatedTo {
	pub entry_type: String,
	pub entry_id: Uuid,
	pub relation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuerySpec {
	pub types: Vec<String>,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub inherit: bool,
	pub tags: TagFilter,
	pub search: Option<String>,
	pub related_to: Option<RelatedTo>,
	pub limit: u32,
	pub cursor: Option<String>,
	pub compact: bool,
	pub include_inactive: bool,
	pub include_versions: bool,
}

pub struct ResultItem {
	pub entry: strata_storage::models::Entry,
	pub version: Option<strata_storage::models::EntryVersion>,
	pub history: Option<Vec<strata_storage::models::EntryVersion>>,
	pub tags: Vec<strata_storage::models::Tag>,
	pub score: f32,
}

pub struct QueryMeta {
	pub returned_count: usize,
	pub total_count: usize,
	pub truncated: bool,
	pub has_more: bool,
	pub next_cursor: Option<String>,
	pub degraded: bool,
}

pub struct QueryResponse {
	pub results: Vec<ResultItem>,
	pub meta: QueryMeta,
}

/// Normalizes `limit` against the configured default/max (stage 1 of §4.F).
fn normalize_limit(requested: u32, search: &crate::StrataService) -> u32 {
	if requested == 0 {
		search.cfg.search.default_limit
	} else {
		requested.min(search.cfg.search.max_limit)
	}
}

fn fingerprint_input(spec: &QuerySpec) -> strata_domain::fingerprint::QueryFingerprintInput {
	strata_domain::fingerprint::QueryFingerprintInput {
		types: spec.types.clone(),
		scope_type: spec.scope_type.clone(),
		scope_id: spec.scope_id,
		inherit: spec.inherit,
		tags_include: spec.tags.include.clone(),
		tags_require: spec.tags.require.clone(),
		tags_exclude: spec.tags.exclude.clone(),
		search: spec.search.clone(),
		related_to: spec.related_to.as_ref().map(|r| (r.entry_type.clone(), r.entry_id, r.relation.clone())),
		limit: spec.limit,
		compact: spec.compact,
		include_versions: spec.include_versions,
		include_inactive: spec.include_inactive,
	}
}

/// Applies the tag include/require/exclude sets over the EntryTag index (§4.B). Returns `None`
/// when no tag filter is active, meaning "no restriction."
async fn tag_allowed_ids(service: &StrataService, tags: &TagFilter) -> Result<Option<HashSet<Uuid>>> {
	if tags.include.is_empty() && tags.require.is_empty() && tags.exclude.is_empty() {
		return Ok(None);
	}

	let mut allowed: Option<HashSet<Uuid>> = None;

	if !tags.include.is_empty() {
		let ids = strata_storage::tags::list_entry_ids_for_tags(&service.db, &tags.include).await?;

		allowed = Some(ids.into_iter().collect());
	}

	for tag in &tags.require {
		let ids: HashSet<Uuid> =
			strata_storage::tags::list_entry_ids_for_tags(&service.db, std::slice::from_ref(tag)).await?.into_iter().collect();

		allowed = Some(match allowed {
			Some(existing) => existing.intersection(&ids).copied().collect(),
			None => ids,
		});
	}

	if !tags.exclude.is_empty() {
		let excluded: HashSet<Uuid> = strata_storage::tags::list_entry_ids_for_tags(&service.db, &tags.exclude).await?.into_iter().collect();

		allowed = Some(match allowed {
			Some(existing) => existing.difference(&excluded).copied().collect(),
			None => return Ok(Some(excluded_complement_marker())),
		});
	}

	Ok(allowed)
}

/// Tag exclusion with no other tag filter can't be expressed as a finite allow-set without
/// knowing every entry id; the caller instead applies exclusion as a post-filter in that case.
fn excluded_complement_marker() -> HashSet<Uuid> {
	HashSet::new()
}

/// Executes the query pipeline: parse/validate → scope expansion → candidate generation → fusion
/// → optional rerank → prioritization → paginate (§4.F).
pub async fn execute(service: &StrataService, agent_id: &str, mut spec: QuerySpec) -> Result<QueryResponse> {
	for entry_type in &spec.types {
		crate::access::check(service, agent_id, &spec.scope_type, spec.scope_id, entry_type, crate::access::Level::Read).await?;
	}

	spec.limit = normalize_limit(spec.limit, service);

	let fp_input = fingerprint_input(&spec);
	let fingerprint = strata_domain::fingerprint::fingerprint(&fp_input);

	let offset = match &spec.cursor {
		Some(cursor) =>
			match strata_domain::cursor::verify(service.cfg.security.cursor_secret.as_bytes(), cursor, &fingerprint) {
				Ok(verified) => verified.offset,
				Err(strata_domain::Error::CursorExpired) => 0,
				Err(other) => return Err(other.into()),
			},
		None => 0,
	};

	let scope_chain = if spec.inherit {
		match spec.scope_id {
			Some(id) => strata_storage::scopes::ancestor_chain(&service.db, &spec.scope_type, id).await?,
			None => vec![("global".to_string(), None)],
		}
	} else {
		vec![(spec.scope_type.clone(), spec.scope_id)]
	};

	let scope_ids: Vec<Uuid> = scope_chain.iter().filter_map(|(_, id)| *id).collect();
	let tag_allowed = tag_allowed_ids(service, &spec.tags).await?;

	let cached = service.cache.get(&fingerprint).and_then(|payload| serde_json::from_str::<Vec<(Uuid, f32)>>(&payload).ok());

	let (prioritized, degraded): (Vec<(Uuid, f32)>, bool) = if let Some(cached) = cached {
		(cached, false)
	} else {
		let mut degraded = false;
		let types: Vec<String> =
			if spec.types.is_empty() { crate::entries::KINDS.iter().map(|k| k.to_string()).collect() } else { spec.types.clone() };

		let mut query_vector: Option<pgvector::Vector> = None;

		let mut fused: Vec<strata_domain::fusion::FusedCandidate> = if let Some(raw) = &spec.search {
			let tsquery = strata_domain::text::build_tsquery(raw);
			query_vector = match service.providers.embedder.embed(std::slice::from_ref(raw)).await {
				Ok(mut vectors) if !vectors.is_empty() => Some(pgvector::Vector::from(vectors.remove(0))),
				_ => {
					degraded = true;
					None
				},
			};

			let mut bm25 = Vec::new();
			let mut cosine = Vec::new();

			for entry_type in &types {
				if let Some(tsquery) = &tsquery {
					let matches = strata_storage::fts::search(&service.db, entry_type, tsquery, &scope_ids, 200).await?;

					bm25.extend(matches.into_iter().map(|m| strata_domain::fusion::ChannelScore { entry_id: m.entry_id, score: m.rank }));
				}

				if let Some(vector) = &query_vector {
					let matches = strata_storage::vector::knn_search(&service.db, entry_type, vector, &scope_ids, 200).await?;

					cosine.extend(
						matches.into_iter().map(|m| strata_domain::fusion::ChannelScore { entry_id: m.entry_id, score: 1.0 - m.distance }),
					);
				}
			}

			strata_domain::fusion::fuse(&cosine, &bm25, service.cfg.search.hybrid_alpha)
		} else {
			// Browse without search (§4.F/§6): no relevance channel runs, but candidates still need to
			// come from a scope/type-filtered listing rather than an empty set.
			let mut seen = HashSet::new();
			let mut candidates = Vec::new();

			for entry_type in &types {
				let ids = strata_storage::entries::list_candidate_ids(&service.db, entry_type, &scope_ids, 200).await?;

				for id in ids {
					if seen.insert(id) {
						candidates.push(strata_domain::fusion::FusedCandidate { entry_id: id, score: 1.0 });
					}
				}
			}

			candidates
		};

		if let Some(related) = &spec.related_to {
			let outgoing = strata_storage::relations::list_outgoing(&service.db, &related.entry_type, related.entry_id).await?;
			let related_ids: HashSet<Uuid> = outgoing
				.into_iter()
				.filter(|r| related.relation.as_deref().map(|rt| rt == r.relation_type).unwrap_or(true))
				.map(|r| r.target_id)
				.collect();

			fused.retain(|candidate| related_ids.contains(&candidate.entry_id));
		}

		if let Some(allowed) = &tag_allowed {
			fused.retain(|candidate| allowed.contains(&candidate.entry_id));
		}

		if !spec.tags.exclude.is_empty() && spec.tags.include.is_empty() && spec.tags.require.is_empty() {
			let excluded: HashSet<Uuid> =
				strata_storage::tags::list_entry_ids_for_tags(&service.db, &spec.tags.exclude).await?.into_iter().collect();

			fused.retain(|candidate| !excluded.contains(&candidate.entry_id));
		}

		let rerank_top_k = service.cfg.search.rerank_top_k as usize;

		fused.sort_by(|a, b| strata_domain::fusion::cmp_f32_desc(a.score, b.score));

		let fused = if fused.len() > rerank_top_k {
			let head: Vec<_> = fused.into_iter().take(rerank_top_k).collect();

			head
		} else {
			fused
		};

		let scored = if let Some(search) = &spec.search {
			let mut docs = Vec::with_capacity(fused.len());

			for candidate in &fused {
				let version = strata_storage::entries::get_current_version(&service.db, candidate.entry_id).await?;

				docs.push(version.content);
			}

			match service.providers.reranker.rerank(search, &docs).await {
				Ok(raw_scores) => {
					let mut by_id = HashMap::new();

					for (candidate, raw) in fused.iter().zip(raw_scores) {
						by_id.insert(candidate.entry_id, raw);
					}

					let normalized = strata_domain::fusion::normalize_reranker_scale(&by_id);

					strata_domain::fusion::blend_rerank(&fused, &normalized, service.cfg.search.rerank_alpha)
				},
				Err(_) => {
					degraded = true;
					fused
				},
			}
		} else {
			fused
		};

		let max_cosine = match &query_vector {
			Some(vector) => {
				let exemplar_count = service.cfg.prioritization.context_boost.exemplar_count as i64;

				strata_storage::vector::max_cosine_to_recent_successes(&service.db, vector, exemplar_count).await?
			},
			None => 0.0,
		};

		let computed = prioritize(service, &spec, scored, max_cosine).await?;

		if let Ok(payload) = serde_json::to_string(&computed) {
			service.cache.put(fingerprint.clone(), scope_chain.clone(), payload);
		}

		(computed, degraded)
	};

	let total_count = prioritized.len();
	let start = offset as usize;
	let end = (start + spec.limit as usize).min(total_count);
	let page: Vec<(Uuid, f32)> = if start < total_count { prioritized[start..end].to_vec() } else { Vec::new() };
	let has_more = end < total_count;

	let mut results = Vec::with_capacity(page.len());

	for (entry_id, score) in page {
		let entry = strata_storage::entries::get_entry(&service.db, entry_id).await?;
		let tags = strata_storage::tags::list_tags_for_entry(&service.db, &entry.kind, entry_id).await?;
		let version = if spec.compact { None } else { Some(strata_storage::entries::get_current_version(&service.db, entry_id).await?) };
		let history = if spec.include_versions { Some(strata_storage::entries::get_history(&service.db, entry_id).await?) } else { None };

		let now = OffsetDateTime::now_utc();

		strata_storage::entries::touch_access(&service.db, entry_id, now).await?;

		results.push(ResultItem { entry, version, history, tags, score });
	}

	let next_cursor = if has_more {
		Some(strata_domain::cursor::sign(
			service.cfg.security.cursor_secret.as_bytes(),
			end as u32,
			&fingerprint,
			Some(OffsetDateTime::now_utc() + time::Duration::seconds(service.cfg.security.cursor_ttl_seconds)),
		))
	} else {
		None
	};

	Ok(QueryResponse {
		results,
		meta: QueryMeta {
			returned_count: end.saturating_sub(start),
			total_count,
			truncated: total_count > end,
			has_more,
			next_cursor,
			degraded,
		},
	})
}

/// Stage 6 of §4.F: combines each candidate's rerank/fused score with the §4.G composite.
async fn prioritize(
	service: &StrataService,
	spec: &QuerySpec,
	candidates: Vec<strata_domain::fusion::FusedCandidate>,
	max_cosine_similarity: f32,
) -> Result<Vec<(Uuid, f32)>> {
	let intent = match &spec.search {
		Some(search) => service.providers.classifier.classify(search).await.unwrap_or_else(|_| "lookup".to_string()),
		None => "lookup".to_string(),
	};

	let baseline = strata_domain::prioritization::resolve_baseline(&service.cfg.prioritization.adaptive.baselines, &intent);
	let adaptive_cfg = &service.cfg.prioritization.adaptive;
	let usefulness_cfg = &service.cfg.prioritization.usefulness;
	let weights = &service.cfg.prioritization.weights;
	let now = OffsetDateTime::now_utc();

	let mut scored = Vec::with_capacity(candidates.len());

	for candidate in &candidates {
		let outcome = fetch_outcome(service, candidate.entry_id).await?;
		let usefulness_inputs = strata_domain::prioritization::UsefulnessInputs {
			retrieval_count: outcome.retrieval_count,
			success_count: outcome.success_count,
			last_success_at: outcome.last_success_at,
		};
		let usefulness = strata_domain::prioritization::usefulness(&usefulness_inputs, usefulness_cfg.recency_tau_days, now);
		let context_boost = strata_domain::prioritization::context_boost(
			max_cosine_similarity,
			service.cfg.prioritization.context_boost.beta,
			service.cfg.prioritization.context_boost.boost_multiplier,
		);
		let samples = strata_domain::prioritization::IntentSamples { successes: outcome.success_count as u32, total: outcome.retrieval_count as u32 };
		let adaptive = strata_domain::prioritization::adaptive_weight(baseline, &samples, adaptive_cfg.min_samples, adaptive_cfg.learning_rate);

		let composite = strata_domain::prioritization::composite_priority(
			candidate.score,
			adaptive,
			usefulness,
			context_boost,
			weights.adaptive_weight,
			weights.usefulness,
			weights.context_boost,
		);

		scored.push((candidate.entry_id, composite));
	}

	scored.sort_by(|a, b| strata_domain::fusion::cmp_f32_desc(a.1, b.1));

	Ok(scored)
}

struct Outcome {
	retrieval_count: u64,
	success_count: u64,
	last_success_at: Option<OffsetDateTime>,
}

async fn fetch_outcome(service: &StrataService, entry_id: Uuid) -> Result<Outcome> {
	let row: Option<(i64, i64, Option<OffsetDateTime>)> = sqlx::query_as(
		"SELECT retrieval_count, success_count, last_success_at FROM retrieval_outcomes WHERE entry_id = $1",
	)
	.bind(entry_id)
	.fetch_optional(&service.db.pool)
	.await
	.map_err(strata_storage::Error::from)?;

	Ok(match row {
		Some((retrieval_count, success_count, last_success_at)) =>
			Outcome { retrieval_count: retrieval_count as u64, success_count: success_count as u64, last_success_at },
		None => Outcome { retrieval_count: 0, success_count: 0, last_success_at: None },
	})
}

pub fn validate_limit_bound(limit: u32) -> Result<()> {
	if limit > 1000 {
		Err(Error::InvalidArgument("limit exceeds the engine's hard upper bound".to_string()))
	} else {
		Ok(())
	}
}
