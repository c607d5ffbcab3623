use std::collections::HashSet;

use proptest::collection::vec;
use proptest::prelude::*;

use rs_next_core::model::generate;
use rs_next_core::pipeline::prepare;
use rs_next_core::text::{Vocabulary, normalize, normalize_to_string};

fn corpus() -> impl Strategy<Value = String> {
	"[a-zA-Z,.!'\" \\n\\r\\t\u{feff}]{0,300}"
}

proptest! {
	#[test]
	fn prop_vocabulary_size_is_distinct_plus_one(raw in corpus()) {
		let tokens = normalize(&raw);
		let distinct: HashSet<&String> = tokens.iter().collect();
		let vocabulary = Vocabulary::build(&tokens);
		prop_assert_eq!(vocabulary.size(), distinct.len() + 1);
	}

	#[test]
	fn prop_inverse_of_forward_is_identity(raw in corpus()) {
		let tokens = normalize(&raw);
		let vocabulary = Vocabulary::build(&tokens);
		for token in &tokens {
			let id = vocabulary.id(token).unwrap();
			prop_assert!(id >= 1);
			prop_assert_eq!(vocabulary.token(id), Some(token.as_str()));
		}
	}

	#[test]
	fn prop_ids_follow_first_occurrence(words in vec("[a-d]{1,2}", 0..60)) {
		let vocabulary = Vocabulary::build(&words);
		let mut seen = Vec::new();
		for word in &words {
			if !seen.contains(word) {
				seen.push(word.clone());
			}
		}
		let ordered: Vec<&str> = vocabulary.iter().map(|(_, t)| t).collect();
		prop_assert_eq!(ordered, seen.iter().map(String::as_str).collect::<Vec<_>>());
	}

	#[test]
	fn prop_window_count(ids in vec(1u32..50, 0..80), window in 1usize..8) {
		let windows = generate(&ids, window);
		prop_assert_eq!(windows.len(), ids.len().saturating_sub(window));
		for (i, w) in windows.iter().enumerate() {
			prop_assert_eq!(&w.context[..], &ids[i..i + window]);
			prop_assert_eq!(w.target, ids[i + window]);
		}
	}

	#[test]
	fn prop_normalizer_fixed_point(raw in corpus()) {
		let once = normalize_to_string(&raw);
		prop_assert_eq!(normalize_to_string(&once), once.clone());
		prop_assert_eq!(normalize(&once), normalize(&raw));
	}

	#[test]
	fn prop_prepare_is_deterministic(raw in corpus(), window in 1usize..5) {
		let a = prepare(&raw, window).unwrap();
		let b = prepare(&raw, window).unwrap();
		prop_assert_eq!(a.vocabulary, b.vocabulary);
		prop_assert_eq!(a.ids, b.ids);
		prop_assert_eq!(a.windows, b.windows);
	}
}
