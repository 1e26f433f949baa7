use std::collections::BTreeMap;

use time::OffsetDateTime;

const NEUTRAL_USEFULNESS: f32 = 0.5;
const MIN_RETRIEVALS_FOR_SIGNAL: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct IntentSamples {
	pub successes: u32,
	pub total: u32,
}

/// Learned weight = `clamp(baseline + learningRate·(successRate − 0.5), [0.5, 2.0])`.
/// Confidence = `clamp((samples−minSamples)/90, [0,1])`.
/// Final weight = `confidence·learned + (1−confidence)·baseline`.
pub fn adaptive_weight(
	baseline: f32,
	samples: &IntentSamples,
	min_samples: u32,
	learning_rate: f32,
) -> f32 {
	if samples.total == 0 {
		return baseline;
	}

	let success_rate = samples.successes as f32 / samples.total as f32;
	let learned = (baseline + learning_rate * (success_rate - 0.5)).clamp(0.5, 2.0);
	let confidence = if samples.total <= min_samples {
		0.0
	} else {
		(((samples.total - min_samples) as f32) / 90.0).clamp(0.0, 1.0)
	};

	confidence * learned + (1.0 - confidence) * baseline
}

pub fn resolve_baseline(baselines: &BTreeMap<String, f32>, intent: &str) -> f32 {
	baselines.get(intent).copied().unwrap_or(1.0)
}

#[derive(Debug, Clone, Copy)]
pub struct UsefulnessInputs {
	pub retrieval_count: u64,
	pub success_count: u64,
	pub last_success_at: Option<OffsetDateTime>,
}

/// `0.3·volumeConfidence + 0.5·successRate + 0.2·recencyBoost`, with `recencyBoost =
/// exp(−daysSinceLastSuccess/15)`. Entries with fewer than two retrievals return the neutral
/// `0.5` rather than a noisy estimate from too little data.
pub fn usefulness(inputs: &UsefulnessInputs, recency_tau_days: f32, now: OffsetDateTime) -> f32 {
	if inputs.retrieval_count < MIN_RETRIEVALS_FOR_SIGNAL as u64 {
		return NEUTRAL_USEFULNESS;
	}

	let success_rate = inputs.success_count as f32 / inputs.retrieval_count as f32;
	// Saturates at 1.0 once retrieval volume comfortably exceeds the no-signal floor.
	let volume_confidence = ((inputs.retrieval_count as f32) / 20.0).clamp(0.0, 1.0);
	let recency_boost = match inputs.last_success_at {
		Some(last_success_at) => {
			let days = (now - last_success_at).as_seconds_f32() / 86_400.0;

			(-days.max(0.0) / recency_tau_days).exp()
		},
		None => 0.0,
	};

	0.3 * volume_confidence + 0.5 * success_rate + 0.2 * recency_boost
}

/// `clamp(1 + beta·maxCosine, [1, boostMultiplier])`, where `maxCosine` is the highest cosine
/// similarity between the query embedding and a corpus of recent successful retrievals. Neutral
/// (1.0, no boost) when no query embedding was available, since callers pass `0.0` in that case.
pub fn context_boost(max_cosine_similarity: f32, beta: f32, boost_multiplier: f32) -> f32 {
	(1.0 + beta * max_cosine_similarity).clamp(1.0, boost_multiplier)
}

/// `final = rerank · (0.4·adaptiveWeight + 0.3·usefulness + 0.3·contextBoost)`.
pub fn composite_priority(
	rerank_score: f32,
	adaptive_weight: f32,
	usefulness: f32,
	context_boost: f32,
	weight_adaptive: f32,
	weight_usefulness: f32,
	weight_context_boost: f32,
) -> f32 {
	rerank_score
		* (weight_adaptive * adaptive_weight
			+ weight_usefulness * usefulness
			+ weight_context_boost * context_boost)
}
