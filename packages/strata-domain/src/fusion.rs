use std::{cmp::Ordering, collections::HashMap};

use uuid::Uuid;

const COVERAGE_BONUS: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct ChannelScore {
	pub entry_id: Uuid,
	pub score: f32,
}

/// Min-max normalizes a channel's raw scores to `[0, 1]`. A channel with zero spread (including a
/// single candidate) normalizes every score to `1.0` rather than dividing by zero.
pub fn min_max_normalize(scores: &[ChannelScore]) -> HashMap<Uuid, f32> {
	let mut out = HashMap::new();

	if scores.is_empty() {
		return out;
	}

	let min = scores.iter().map(|s| s.score).fold(f32::INFINITY, f32::min);
	let max = scores.iter().map(|s| s.score).fold(f32::NEG_INFINITY, f32::max);
	let spread = max - min;

	for entry in scores {
		let normalized = if spread <= f32::EPSILON { 1.0 } else { (entry.score - min) / spread };

		out.insert(entry.entry_id, normalized);
	}

	out
}

#[derive(Debug, Clone, Copy)]
pub struct FusedCandidate {
	pub entry_id: Uuid,
	pub score: f32,
}

/// `score = hybridAlpha·cosine + (1−hybridAlpha)·bm25`, plus a `+0.05` coverage bonus for entries
/// that only appeared in one channel.
pub fn fuse(cosine: &[ChannelScore], bm25: &[ChannelScore], hybrid_alpha: f32) -> Vec<FusedCandidate> {
	let cosine_norm = min_max_normalize(cosine);
	let bm25_norm = min_max_normalize(bm25);

	let mut ids: Vec<Uuid> = cosine_norm.keys().chain(bm25_norm.keys()).copied().collect();

	ids.sort();
	ids.dedup();

	ids.into_iter()
		.map(|entry_id| {
			let cosine_score = cosine_norm.get(&entry_id).copied();
			let bm25_score = bm25_norm.get(&entry_id).copied();
			let both_channels = cosine_score.is_some() && bm25_score.is_some();
			let score = hybrid_alpha * cosine_score.unwrap_or(0.0)
				+ (1.0 - hybrid_alpha) * bm25_score.unwrap_or(0.0)
				+ if both_channels { 0.0 } else { COVERAGE_BONUS };

			FusedCandidate { entry_id, score }
		})
		.collect()
}

/// `rerankAlpha·rerankerScore + (1−rerankAlpha)·fusedScore`. `reranker_scores` missing an id falls
/// back to the neutral `0.5` the reranker contract specifies for missing fields.
pub fn blend_rerank(
	fused: &[FusedCandidate],
	reranker_scores: &HashMap<Uuid, f32>,
	rerank_alpha: f32,
) -> Vec<FusedCandidate> {
	fused
		.iter()
		.map(|candidate| {
			let reranker_score = reranker_scores.get(&candidate.entry_id).copied().unwrap_or(0.5);
			let score = rerank_alpha * reranker_score + (1.0 - rerank_alpha) * candidate.score;

			FusedCandidate { entry_id: candidate.entry_id, score }
		})
		.collect()
}

/// Normalizes a raw reranker response (which may arrive scaled to `[0,1]`, `[0,10]`, or
/// `[0,100]`) to `[0, 1]` by inferring the scale from the maximum observed value.
pub fn normalize_reranker_scale(raw_scores: &HashMap<Uuid, f32>) -> HashMap<Uuid, f32> {
	let max = raw_scores.values().copied().fold(0.0_f32, f32::max);
	let scale = if max > 10.0 {
		100.0
	} else if max > 1.0 {
		10.0
	} else {
		1.0
	};

	raw_scores.iter().map(|(id, score)| (*id, (score / scale).clamp(0.0, 1.0))).collect()
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[derive(Debug, Clone, Copy)]
pub struct TieBreakKey {
	pub entry_id: Uuid,
	/// Lower is more specific: session=0, project=1, org=2, global=3.
	pub scope_specificity: u8,
	pub updated_at_unix: i64,
}

/// Ties after the composite score are broken by scope specificity (more specific first), then
/// recency of last update (newer first), then the entry id for a total, stable order.
pub fn cmp_tie_break(a: &TieBreakKey, b: &TieBreakKey) -> Ordering {
	a.scope_specificity
		.cmp(&b.scope_specificity)
		.then_with(|| b.updated_at_unix.cmp(&a.updated_at_unix))
		.then_with(|| a.entry_id.cmp(&b.entry_id))
}
