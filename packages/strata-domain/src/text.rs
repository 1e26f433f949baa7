use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Tokenizes a raw search string into lowercase, NFC-normalized word tokens, dropping anything
/// that isn't alphanumeric so it can never be interpreted as `tsquery` operator syntax.
pub fn tokenize(text: &str) -> Vec<String> {
	text.unicode_words()
		.map(|word| word.nfc().collect::<String>().to_lowercase())
		.filter(|word| !word.is_empty())
		.collect()
}

/// Builds a `to_tsquery('simple', ...)`-safe AND-query from a raw search string. Each token is
/// quoted individually so embedded `&`, `|`, `!`, or `:` characters in the input can't change the
/// query's structure.
pub fn build_tsquery(search: &str) -> Option<String> {
	let tokens = tokenize(search);

	if tokens.is_empty() {
		return None;
	}

	let quoted: Vec<String> = tokens.iter().map(|token| format!("'{}'", token.replace('\'', ""))).collect();

	Some(quoted.join(" & "))
}
