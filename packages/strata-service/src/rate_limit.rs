use std::{collections::HashMap, sync::Mutex};

use time::OffsetDateTime;

/// A fixed-window request counter, reset whenever the window has elapsed since it started. Single
/// writer/multi-reader via a `Mutex`, the same pattern `cache::QueryCache` uses for its in-memory
/// map (§5 Backpressure).
struct Window {
	count: u32,
	started_at: OffsetDateTime,
}

impl Window {
	fn fresh(now: OffsetDateTime) -> Self {
		Self { count: 0, started_at: now }
	}
}

/// Tracks per-agent and global request counts over a sliding fixed window and rejects once either
/// cap is exceeded, per §5's "Handler layer applies rate limits per agentId and a global cap."
pub struct RateLimiter {
	window_seconds: i64,
	max_per_agent: u32,
	max_global: u32,
	inner: Mutex<State>,
}

struct State {
	global: Window,
	per_agent: HashMap<String, Window>,
}

/// Seconds remaining until the exceeded window resets, surfaced to the caller as a retry-after hint.
pub struct RateLimited {
	pub retry_after_seconds: i64,
}

impl RateLimiter {
	pub fn new(cfg: &strata_config::RateLimit) -> Self {
		let now = OffsetDateTime::now_utc();

		Self {
			window_seconds: cfg.window_seconds,
			max_per_agent: cfg.max_requests_per_agent,
			max_global: cfg.max_requests_global,
			inner: Mutex::new(State { global: Window::fresh(now), per_agent: HashMap::new() }),
		}
	}

	/// Increments the agent's and the global counter for the current window, rejecting the request
	/// if either cap is already exhausted.
	pub fn check(&self, agent_id: &str, now: OffsetDateTime) -> Result<(), RateLimited> {
		let mut guard = self.inner.lock().expect("rate limiter mutex is never poisoned by a panicking holder");

		if let Some(retry_after) = Self::bump(&mut guard.global, self.max_global, self.window_seconds, now) {
			return Err(RateLimited { retry_after_seconds: retry_after });
		}

		let window = guard.per_agent.entry(agent_id.to_string()).or_insert_with(|| Window::fresh(now));

		if let Some(retry_after) = Self::bump(window, self.max_per_agent, self.window_seconds, now) {
			return Err(RateLimited { retry_after_seconds: retry_after });
		}

		Ok(())
	}

	/// Resets `window` if its period has elapsed, then increments it; returns the retry-after hint
	/// if the increment would exceed `max`.
	fn bump(window: &mut Window, max: u32, window_seconds: i64, now: OffsetDateTime) -> Option<i64> {
		let elapsed = (now - window.started_at).whole_seconds();

		if elapsed >= window_seconds {
			*window = Window::fresh(now);
		}

		if window.count >= max {
			return Some(window_seconds - (now - window.started_at).whole_seconds());
		}

		window.count += 1;

		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg(window_seconds: i64, max_per_agent: u32, max_global: u32) -> strata_config::RateLimit {
		strata_config::RateLimit { window_seconds, max_requests_per_agent: max_per_agent, max_requests_global: max_global }
	}

	#[test]
	fn rejects_once_per_agent_cap_is_exhausted() {
		let limiter = RateLimiter::new(&cfg(60, 2, 100));
		let now = OffsetDateTime::now_utc();

		assert!(limiter.check("agent-1", now).is_ok());
		assert!(limiter.check("agent-1", now).is_ok());

		let rejected = limiter.check("agent-1", now);

		assert!(rejected.is_err());
		assert!(rejected.unwrap_err().retry_after_seconds > 0);
	}

	#[test]
	fn one_agent_exhausting_its_cap_does_not_block_another_agent() {
		let limiter = RateLimiter::new(&cfg(60, 1, 100));
		let now = OffsetDateTime::now_utc();

		assert!(limiter.check("agent-1", now).is_ok());
		assert!(limiter.check("agent-1", now).is_err());
		assert!(limiter.check("agent-2", now).is_ok());
	}

	#[test]
	fn global_cap_rejects_even_under_the_per_agent_cap() {
		let limiter = RateLimiter::new(&cfg(60, 100, 1));
		let now = OffsetDateTime::now_utc();

		assert!(limiter.check("agent-1", now).is_ok());
		assert!(limiter.check("agent-2", now).is_err());
	}
}
