/// English stopwords, matching the classic analyzer stop set.
const STOPWORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
	"it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
	"these", "they", "this", "to", "was", "will", "with",
];

/// Lowercase, split on non-alphanumerics, drop stopwords. No stemming.
pub fn tokenize(text: &str) -> Vec<String> {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(|token| token.to_lowercase())
		.filter(|token| !STOPWORDS.contains(&token.as_str()))
		.collect()
}
