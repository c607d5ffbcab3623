use log::debug;

use crate::error::{Error, Result};
use crate::text::{RESERVED_ID, Vocabulary, normalize};

use super::classifier::SequenceClassifier;

/// Turns free-form text into the context ids a model expects.
///
/// # Behavior
/// - Tokenizes with the training-time normalizer.
/// - Encodes every token; the first unknown one fails the request.
/// - Keeps the last `window_size` ids when more are given.
///
/// # Errors
/// - `Error::VocabularyMismatch` if model and vocabulary were not trained together
/// - `Error::UnknownToken` for a token absent from the vocabulary
/// - `Error::ContextTooShort` for fewer than `window_size` tokens
pub fn encode_context<M>(model: &M, vocabulary: &Vocabulary, text: &str) -> Result<Vec<u32>>
where
	M: SequenceClassifier + ?Sized,
{
	if model.vocab_size() != vocabulary.size() {
		return Err(Error::VocabularyMismatch { vocabulary: vocabulary.size(), model: model.vocab_size() });
	}

	let tokens = normalize(text);
	let mut ids = vocabulary.encode(&tokens)?;

	let window = model.window_size();
	if ids.len() < window {
		return Err(Error::ContextTooShort { needed: window, got: ids.len() });
	}
	Ok(ids.split_off(ids.len() - window))
}

/// Predicts the single most likely next token after `text`.
///
/// Ties between equally probable ids go to the lowest id. Returns exactly one
/// token, never a continuation.
///
/// # Errors
/// Everything `encode_context` returns, plus `Error::EmptyPrediction` if the
/// winning id has no token (only the reserved id can be in that situation
/// when the sizes match).
pub fn predict_next<M>(model: &M, vocabulary: &Vocabulary, text: &str) -> Result<String>
where
	M: SequenceClassifier + ?Sized,
{
	let context = encode_context(model, vocabulary, text)?;
	let id = model.predict_class(&context)?;
	let word = vocabulary.token(id).ok_or(Error::EmptyPrediction(id))?;
	debug!("{text:?} -> {word:?} (id {id})");
	Ok(word.to_owned())
}

/// Returns the `k` most likely next tokens with their probabilities.
///
/// Sorted by probability (descending), then id (ascending).
///
/// # Notes
/// The reserved id is never part of the result: when it carries the highest
/// probability the list starts with the best real token, whereas
/// `predict_next` fails with `Error::EmptyPrediction(0)` on the same input.
pub fn predict_top_k<M>(model: &M, vocabulary: &Vocabulary, text: &str, k: usize) -> Result<Vec<(String, f32)>>
where
	M: SequenceClassifier + ?Sized,
{
	let context = encode_context(model, vocabulary, text)?;
	let probs = model.predict_proba(&context)?;

	let mut ranked: Vec<(u32, f32)> = probs
		.iter()
		.enumerate()
		.map(|(id, &p)| (id as u32, p))
		.filter(|&(id, _)| id != RESERVED_ID)
		.collect();
	// stable: equal probabilities keep id order
	ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

	ranked
		.into_iter()
		.take(k)
		.map(|(id, p)| {
			let word = vocabulary.token(id).ok_or(Error::EmptyPrediction(id))?;
			Ok((word.to_owned(), p))
		})
		.collect()
}
