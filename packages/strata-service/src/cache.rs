use std::{
	collections::{HashMap, VecDeque},
	sync::Mutex,
};

use time::OffsetDateTime;

/// A cached response carries the scope chain it was computed against, so a write under any of
/// those scopes can evict it without the cache needing to re-run the query.
#[derive(Debug, Clone)]
struct Entry {
	fingerprint: String,
	scope_chain: Vec<(String, Option<uuid::Uuid>)>,
	payload: String,
	expires_at: OffsetDateTime,
}

/// An LRU cache keyed by QuerySpec fingerprint (§4.H). Single writer/multi-reader via a `Mutex`,
/// matching §5's "cache uses a single writer/multi-reader structure" — contention is short-lived
/// since entries only move within an in-memory map.
pub struct QueryCache {
	capacity: usize,
	ttl_seconds: i64,
	inner: Mutex<Inner>,
}

struct Inner {
	order: VecDeque<String>,
	entries: HashMap<String, Entry>,
}

impl QueryCache {
	pub fn new(capacity: usize, ttl_seconds: i64) -> Self {
		Self {
			capacity,
			ttl_seconds,
			inner: Mutex::new(Inner { order: VecDeque::new(), entries: HashMap::new() }),
		}
	}

	pub fn get(&self, fingerprint: &str) -> Option<String> {
		let mut guard = self.inner.lock().expect("cache mutex is never poisoned by a panicking holder");
		let now = OffsetDateTime::now_utc();
		let expired = guard.entries.get(fingerprint).map(|entry| entry.expires_at <= now).unwrap_or(false);

		if expired {
			guard.entries.remove(fingerprint);
			guard.order.retain(|key| key != fingerprint);
			return None;
		}

		let payload = guard.entries.get(fingerprint).map(|entry| entry.payload.clone())?;

		guard.order.retain(|key| key != fingerprint);
		guard.order.push_back(fingerprint.to_string());

		Some(payload)
	}

	pub fn put(&self, fingerprint: String, scope_chain: Vec<(String, Option<uuid::Uuid>)>, payload: String) {
		let mut guard = self.inner.lock().expect("cache mutex is never poisoned by a panicking holder");
		let expires_at = OffsetDateTime::now_utc() + time::Duration::seconds(self.ttl_seconds);

		if !guard.entries.contains_key(&fingerprint) {
			guard.order.push_back(fingerprint.clone());
		}

		guard.entries.insert(fingerprint.clone(), Entry { fingerprint, scope_chain, payload, expires_at });

		while guard.entries.len() > self.capacity {
			let Some(oldest) = guard.order.pop_front() else { break };

			guard.entries.remove(&oldest);
		}
	}

	/// Evicts every cached entry whose scope chain intersects the scope chain of a write, per
	/// §4.H's invalidation rule.
	pub fn invalidate_scope_chain(&self, write_chain: &[(String, Option<uuid::Uuid>)]) {
		let mut guard = self.inner.lock().expect("cache mutex is never poisoned by a panicking holder");
		let stale: Vec<String> = guard
			.entries
			.values()
			.filter(|entry| entry.scope_chain.iter().any(|scope| write_chain.contains(scope)))
			.map(|entry| entry.fingerprint.clone())
			.collect();

		for key in stale {
			guard.entries.remove(&key);
			guard.order.retain(|existing| existing != &key);
		}
	}
}
