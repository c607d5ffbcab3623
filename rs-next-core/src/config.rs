use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters of a training run.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides:
///
/// ```json
/// { "epochs": 10, "hidden_dim": 256 }
/// ```
///
/// # Invariants (checked by `validate`)
/// - sizes, `epochs`, `batch_size` and `checkpoint_every` are non-zero
/// - `learning_rate` is finite and strictly positive
/// - `beta1` and `beta2` are in `[0, 1)`
/// - `epsilon` is finite and strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
	/// Number of context tokens fed to the model (`W`).
	pub window_size: usize,
	/// Width of a token embedding.
	pub embedding_dim: usize,
	/// Width of the hidden ReLU layer.
	pub hidden_dim: usize,
	pub epochs: usize,
	pub batch_size: usize,
	pub learning_rate: f32,
	pub beta1: f32,
	pub beta2: f32,
	pub epsilon: f32,
	/// Seed for weight initialization and per-epoch shuffling.
	pub seed: u64,
	/// Offer the epoch loss to the checkpoint every this many epochs.
	pub checkpoint_every: usize,
	/// Gradient worker threads, `0` means one per CPU.
	pub workers: usize,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			window_size: 3,
			embedding_dim: 10,
			hidden_dim: 128,
			epochs: 2,
			batch_size: 64,
			learning_rate: 0.001,
			beta1: 0.9,
			beta2: 0.999,
			epsilon: 1e-7,
			seed: 42,
			checkpoint_every: 1,
			workers: 0,
		}
	}
}

impl TrainingConfig {
	/// Loads a configuration from a JSON file and validates it.
	pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let contents = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the invariants listed on the struct.
	pub fn validate(&self) -> Result<()> {
		let non_zero = [
			("window_size", self.window_size),
			("embedding_dim", self.embedding_dim),
			("hidden_dim", self.hidden_dim),
			("epochs", self.epochs),
			("batch_size", self.batch_size),
			("checkpoint_every", self.checkpoint_every),
		];
		for (name, value) in non_zero {
			if value == 0 {
				return Err(Error::InvalidConfig(format!("{name} must be > 0")));
			}
		}
		if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
			return Err(Error::InvalidConfig(format!(
				"learning_rate must be positive, got {}",
				self.learning_rate
			)));
		}
		if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
			return Err(Error::InvalidConfig("beta1 and beta2 must be in [0, 1)".to_owned()));
		}
		if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
			return Err(Error::InvalidConfig(format!("epsilon must be positive, got {}", self.epsilon)));
		}
		Ok(())
	}

	/// Number of gradient workers actually used.
	pub fn effective_workers(&self) -> usize {
		if self.workers == 0 { num_cpus::get().max(1) } else { self.workers }
	}
}
