use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One supervised example: `context.len()` consecutive ids and the id that follows them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Window {
	pub context: Vec<u32>,
	pub target: u32,
}

/// Slides a window of `window_size` ids over `ids`.
///
/// For every `i` in `window_size..ids.len()` one window is produced with
/// context `ids[i - window_size..i]` and target `ids[i]`, in increasing `i`.
///
/// # Returns
/// Exactly `ids.len().saturating_sub(window_size)` windows. Too short an
/// input (or `window_size == 0`) yields no windows rather than an error.
pub fn generate(ids: &[u32], window_size: usize) -> Vec<Window> {
	if window_size == 0 || ids.len() <= window_size {
		return Vec::new();
	}

	ids.windows(window_size + 1)
		.map(|w| Window {
			context: w[..window_size].to_vec(),
			target: w[window_size],
		})
		.collect()
}

/// Splits windows into two parallel columns: all contexts and all targets.
pub fn split(windows: &[Window]) -> (Vec<Vec<u32>>, Vec<u32>) {
	windows.iter().map(|w| (w.context.clone(), w.target)).unzip()
}

/// Expands a target id into an exact one-hot row of width `vocab_size`.
///
/// # Errors
/// Returns `Error::TargetOutOfRange` if `target >= vocab_size`.
pub fn one_hot(target: u32, vocab_size: usize) -> Result<Vec<f32>> {
	if target as usize >= vocab_size {
		return Err(Error::TargetOutOfRange { id: target, vocab_size });
	}
	let mut row = vec![0.0; vocab_size];
	row[target as usize] = 1.0;
	Ok(row)
}

/// Expands a whole target column with `one_hot`.
pub fn one_hot_targets(targets: &[u32], vocab_size: usize) -> Result<Vec<Vec<f32>>> {
	targets.iter().map(|&t| one_hot(t, vocab_size)).collect()
}
