pub mod classifier;
pub mod embedding;
pub mod rerank;
pub mod summarizer;

mod error;

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};

pub use error::{Error, Result};

pub fn auth_headers(api_key: &str, default_headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		headers.insert(HeaderName::from_bytes(key.as_bytes())?, value.parse()?);
	}

	Ok(headers)
}

/// Capability injected into the query pipeline's semantic-retrieval stage (§4.F step 4).
#[async_trait]
pub trait Embedder: Send + Sync {
	async fn embed(&self, texts: &[String]) -> color_eyre::Result<Vec<Vec<f32>>>;
}

/// Capability injected into the query pipeline's optional rerank stage (§4.F step 5).
#[async_trait]
pub trait Reranker: Send + Sync {
	async fn rerank(&self, query: &str, docs: &[String]) -> color_eyre::Result<Vec<f32>>;
}

/// Capability used to bucket a query into an intent for the prioritization stage (§4.G).
#[async_trait]
pub trait Classifier: Send + Sync {
	async fn classify(&self, query: &str) -> color_eyre::Result<String>;
}

/// Capability used to compact entry content for `compact=true` responses.
#[async_trait]
pub trait Summarizer: Send + Sync {
	async fn summarize(&self, text: &str, max_words: u32) -> color_eyre::Result<String>;
}

pub struct HttpEmbedder(pub strata_config::ProviderConfig);
pub struct HttpReranker(pub strata_config::ProviderConfig);
pub struct HttpClassifier(pub strata_config::ProviderConfig);
pub struct HttpSummarizer(pub strata_config::ProviderConfig);

#[async_trait]
impl Embedder for HttpEmbedder {
	async fn embed(&self, texts: &[String]) -> color_eyre::Result<Vec<Vec<f32>>> {
		embedding::embed(&self.0, texts).await
	}
}

#[async_trait]
impl Reranker for HttpReranker {
	async fn rerank(&self, query: &str, docs: &[String]) -> color_eyre::Result<Vec<f32>> {
		rerank::rerank(&self.0, query, docs).await
	}
}

#[async_trait]
impl Classifier for HttpClassifier {
	async fn classify(&self, query: &str) -> color_eyre::Result<String> {
		classifier::classify(&self.0, query).await
	}
}

#[async_trait]
impl Summarizer for HttpSummarizer {
	async fn summarize(&self, text: &str, max_words: u32) -> color_eyre::Result<String> {
		summarizer::summarize(&self.0, text, max_words).await
	}
}
