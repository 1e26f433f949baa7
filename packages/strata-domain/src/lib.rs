pub mod cursor;
pub mod error;
pub mod fingerprint;
pub mod fusion;
pub mod prioritization;
pub mod scope;
pub mod text;

pub use error::{Error, Result};

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use time::{Duration, OffsetDateTime};
	use uuid::Uuid;

	use super::*;

	#[test]
	fn cursor_round_trips() {
		let secret = b"test-secret-value-long-enough";
		let fp = "abc123";
		let signed = cursor::sign(secret, 10, fp, None);
		let verified = cursor::verify(secret, &signed, fp).expect("valid cursor");

		assert_eq!(verified.offset, 10);
		assert_eq!(verified.query_fingerprint, fp);
	}

	#[test]
	fn cursor_rejects_tampering() {
		let secret = b"test-secret-value-long-enough";
		let mut signed = cursor::sign(secret, 10, "abc123", None);

		signed.push('x');

		assert!(cursor::verify(secret, &signed, "abc123").is_err());
	}

	#[test]
	fn cursor_rejects_fingerprint_mismatch() {
		let secret = b"test-secret-value-long-enough";
		let signed = cursor::sign(secret, 10, "abc123", None);

		assert!(cursor::verify(secret, &signed, "different").is_err());
	}

	#[test]
	fn cursor_rejects_expired() {
		let secret = b"test-secret-value-long-enough";
		let past = OffsetDateTime::now_utc() - Duration::hours(2);
		let signed = cursor::sign(secret, 10, "abc123", Some(past));

		assert!(matches!(
			cursor::verify(secret, &signed, "abc123"),
			Err(Error::CursorExpired)
		));
	}

	#[test]
	fn scope_rejects_empty_string_scope_id() {
		assert!(matches!(
			scope::validate_scope(scope::ScopeType::Project, Some("")),
			Err(Error::InvalidScope(_))
		));
	}

	#[test]
	fn scope_global_treats_empty_string_as_global() {
		let resolved = scope::validate_scope(scope::ScopeType::Global, Some("")).unwrap();

		assert_eq!(resolved, None);
	}

	#[test]
	fn fusion_combines_channels_with_coverage_bonus() {
		let id_a = Uuid::new_v4();
		let id_b = Uuid::new_v4();
		let cosine = vec![
			fusion::ChannelScore { entry_id: id_a, score: 0.9 },
			fusion::ChannelScore { entry_id: id_b, score: 0.1 },
		];
		let bm25 = vec![fusion::ChannelScore { entry_id: id_a, score: 5.0 }];
		let fused = fusion::fuse(&cosine, &bm25, 0.5);
		let a = fused.iter().find(|c| c.entry_id == id_a).unwrap();
		let b = fused.iter().find(|c| c.entry_id == id_b).unwrap();

		// id_b only appears in one channel (cosine), so it gets the +0.05 coverage bonus.
		assert!(b.score > 0.0);
		assert!(a.score > 0.0);
	}

	#[test]
	fn usefulness_is_neutral_below_signal_floor() {
		let inputs = prioritization::UsefulnessInputs {
			retrieval_count: 1,
			success_count: 1,
			last_success_at: Some(OffsetDateTime::now_utc()),
		};

		assert_eq!(prioritization::usefulness(&inputs, 15.0, OffsetDateTime::now_utc()), 0.5);
	}

	#[test]
	fn usefulness_recency_boost_decays() {
		let now = OffsetDateTime::now_utc();
		let fresh = prioritization::UsefulnessInputs {
			retrieval_count: 10,
			success_count: 8,
			last_success_at: Some(now - Duration::days(1)),
		};
		let stale = prioritization::UsefulnessInputs {
			retrieval_count: 10,
			success_count: 8,
			last_success_at: Some(now - Duration::days(30)),
		};

		assert!(prioritization::usefulness(&fresh, 15.0, now) > prioritization::usefulness(&stale, 15.0, now));
	}

	#[test]
	fn adaptive_weight_falls_back_to_baseline_below_min_samples() {
		let samples = prioritization::IntentSamples { successes: 9, total: 9 };

		assert_eq!(prioritization::adaptive_weight(1.0, &samples, 10, 0.5), 1.0);
	}

	#[test]
	fn tsquery_tokenizes_and_quotes_each_term() {
		let query = text::build_tsquery("rust & async | unsafe").unwrap();

		assert_eq!(query, "'rust' & 'async' & 'unsafe'");
	}

	#[test]
	fn tsquery_is_none_for_empty_search() {
		assert!(text::build_tsquery("   ").is_none());
	}

	#[test]
	fn fingerprint_ignores_field_order() {
		let a = fingerprint::QueryFingerprintInput {
			types: vec!["tool".into(), "guideline".into()],
			scope_type: "global".into(),
			scope_id: None,
			inherit: true,
			tags_include: vec!["b".into(), "a".into()],
			tags_require: vec![],
			tags_exclude: vec![],
			search: Some("hello".into()),
			related_to: None,
			limit: 20,
			compact: false,
			include_versions: false,
			include_inactive: false,
		};
		let mut b = a.clone();

		b.types.reverse();
		b.tags_include.reverse();

		assert_eq!(fingerprint::fingerprint(&a), fingerprint::fingerprint(&b));
	}

	#[test]
	fn fingerprint_changes_with_search() {
		let base = fingerprint::QueryFingerprintInput {
			types: vec![],
			scope_type: "global".into(),
			scope_id: None,
			inherit: false,
			tags_include: vec![],
			tags_require: vec![],
			tags_exclude: vec![],
			search: Some("hello".into()),
			related_to: None,
			limit: 20,
			compact: false,
			include_versions: false,
			include_inactive: false,
		};
		let mut other = base.clone();

		other.search = Some("goodbye".into());

		assert_ne!(fingerprint::fingerprint(&base), fingerprint::fingerprint(&other));
	}

	#[test]
	fn reranker_scale_inference() {
		let raw: HashMap<Uuid, f32> = HashMap::from([(Uuid::new_v4(), 80.0)]);
		let normalized = fusion::normalize_reranker_scale(&raw);

		for v in normalized.values() {
			assert!(*v <= 1.0);
		}
	}
}
