/// Characters dropped from the corpus before tokenization.
///
/// - `\r`: carriage returns left over from CRLF line endings
/// - `\u{feff}`: byte-order mark artifacts
/// - straight and typographic double quotes
const STRIPPED: [char; 5] = ['\r', '\u{feff}', '"', '\u{201c}', '\u{201d}'];

/// Normalizes raw corpus text into an ordered list of tokens.
///
/// # Behavior
/// - Line feeds separate tokens (lines are joined with a space).
/// - Carriage returns, byte-order marks and double quotes are removed.
/// - Remaining text is split on whitespace, empty pieces are dropped.
///
/// # Notes
/// - Punctuation attached to a word is kept (`"Holmes,"` stays one token).
/// - Case is preserved.
/// - Running `normalize` on `normalize(x).join(" ")` gives the same tokens.
pub fn normalize(raw: &str) -> Vec<String> {
	clean(raw).split_whitespace().map(str::to_owned).collect()
}

/// Same as `normalize`, with tokens joined back by a single space.
pub fn normalize_to_string(raw: &str) -> String {
	clean(raw).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean(raw: &str) -> String {
	raw.chars()
		.filter(|c| !STRIPPED.contains(c))
		.map(|c| if c == '\n' { ' ' } else { c })
		.collect()
}
