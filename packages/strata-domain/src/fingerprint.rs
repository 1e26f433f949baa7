use serde::Serialize;
use uuid::Uuid;

/// The subset of a QuerySpec that determines cache identity and cursor validity. Built by the
/// service layer from the normalized request so that equivalent requests always fingerprint the
/// same, regardless of field ordering.
#[derive(Debug, Clone, Serialize)]
pub struct QueryFingerprintInput {
	pub types: Vec<String>,
	pub scope_type: String,
	pub scope_id: Option<Uuid>,
	pub inherit: bool,
	pub tags_include: Vec<String>,
	pub tags_require: Vec<String>,
	pub tags_exclude: Vec<String>,
	pub search: Option<String>,
	pub related_to: Option<(String, Uuid, Option<String>)>,
	pub limit: u32,
	pub compact: bool,
	pub include_versions: bool,
	pub include_inactive: bool,
}

impl QueryFingerprintInput {
	fn canonicalize(&self) -> Self {
		let mut sorted = self.clone();

		sorted.types.sort();
		sorted.tags_include.sort();
		sorted.tags_require.sort();
		sorted.tags_exclude.sort();

		sorted
	}
}

/// `blake3` digest of the canonicalized input, matching this stack's existing use of blake3 for
/// policy-snapshot hashing.
pub fn fingerprint(input: &QueryFingerprintInput) -> String {
	let canonical = input.canonicalize();
	let bytes = serde_json::to_vec(&canonical).expect("QueryFingerprintInput is always serializable");

	blake3::hash(&bytes).to_hex().to_string()
}
