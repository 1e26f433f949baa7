use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Produces a compact summary of an entry's content, used by `compact=true` query results so the
/// response stays small without dropping the entry entirely.
pub async fn summarize(cfg: &strata_config::ProviderConfig, text: &str, max_words: u32) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"text": text,
		"max_words": max_words,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_summarize_response(json)
}

fn parse_summarize_response(json: Value) -> Result<String> {
	json.get("summary")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Summarizer response is missing a summary field."))
}
