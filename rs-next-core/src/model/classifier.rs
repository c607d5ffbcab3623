use crate::error::{Error, Result};
use crate::text::RESERVED_ID;

use super::ops::argmax;

/// A trained model that maps a fixed-width context of ids to a distribution
/// over the vocabulary.
///
/// The predictor only talks to models through this trait, so any model that
/// takes exactly `window_size` ids and returns `vocab_size` probabilities can
/// be plugged in.
pub trait SequenceClassifier {
	/// Number of ids a context must contain.
	fn window_size(&self) -> usize;

	/// Width of the output distribution (distinct tokens + the reserved id).
	fn vocab_size(&self) -> usize;

	/// Returns the probability of every id given `context`.
	///
	/// # Errors
	/// - `Error::ContextShape` if `context.len() != window_size()`
	/// - `Error::TargetOutOfRange` if an id is `>= vocab_size()`
	fn predict_proba(&self, context: &[u32]) -> Result<Vec<f32>>;

	/// Returns the most probable id, the lowest id on ties.
	fn predict_class(&self, context: &[u32]) -> Result<u32> {
		let probs = self.predict_proba(context)?;
		argmax(&probs).map(|id| id as u32).ok_or(Error::EmptyPrediction(RESERVED_ID))
	}
}

/// Checks a context against a model's shape.
pub(crate) fn check_context(context: &[u32], window_size: usize, vocab_size: usize) -> Result<()> {
	if context.len() != window_size {
		return Err(Error::ContextShape { expected: window_size, got: context.len() });
	}
	if let Some(&id) = context.iter().find(|&&id| id as usize >= vocab_size) {
		return Err(Error::TargetOutOfRange { id, vocab_size });
	}
	Ok(())
}
