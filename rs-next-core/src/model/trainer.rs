use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};

use super::checkpoint::BestCheckpoint;
use super::classifier::check_context;
use super::optimizer::Adam;
use super::word_model::{ModelShape, Parameters, WordModel};

/// What happened during a training run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingReport {
	/// Number of training windows.
	pub examples: usize,
	/// Mean cross-entropy of every completed epoch.
	pub epoch_losses: Vec<f32>,
	/// Optimizer updates applied.
	pub steps: usize,
	/// Times the checkpoint file was (over)written.
	pub checkpoints_written: usize,
}

impl TrainingReport {
	pub fn epochs_run(&self) -> usize {
		self.epoch_losses.len()
	}

	pub fn final_loss(&self) -> Option<f32> {
		self.epoch_losses.last().copied()
	}
}

/// A freshly trained model with its report.
#[derive(Clone, Debug)]
pub struct Trained {
	pub model: WordModel,
	pub report: TrainingReport,
}

/// Mini-batch trainer for `WordModel`.
///
/// # Behavior
/// - Categorical cross-entropy against one-hot target rows
/// - Adam updates, one per mini-batch
/// - Examples are reshuffled every epoch with a seeded RNG
/// - Batch gradients are computed in parallel and merged in a fixed order,
///   so a run is reproducible for a given seed and worker count
pub struct Trainer {
	config: TrainingConfig,
}

impl Trainer {
	/// Creates a trainer after validating `config`.
	pub fn new(config: TrainingConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config })
	}

	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	/// Trains a new model of width `vocab_size` on `contexts` / `targets`.
	///
	/// The model shape comes from the configuration. See `train` for the
	/// training loop itself.
	pub fn fit(
		&self,
		contexts: &[Vec<u32>],
		targets: &[Vec<f32>],
		vocab_size: usize,
		checkpoint: Option<&mut BestCheckpoint>,
	) -> Result<Trained> {
		let shape = ModelShape {
			vocab_size,
			window_size: self.config.window_size,
			embedding_dim: self.config.embedding_dim,
			hidden_dim: self.config.hidden_dim,
		};
		let mut model = WordModel::new(shape, self.config.seed)?;
		let report = self.train(&mut model, contexts, targets, checkpoint)?;
		Ok(Trained { model, report })
	}

	/// Trains `model` in place.
	///
	/// # Parameters
	/// - `contexts`: one context of exactly `window_size` ids per example
	/// - `targets`: one one-hot row of width `vocab_size` per example
	/// - `checkpoint`: optional "save best only" hook, offered the mean epoch
	///   loss every `checkpoint_every` epochs
	///
	/// # Errors
	/// - `Error::LengthMismatch` if the two columns differ in length
	/// - `Error::ContextShape` / `Error::TargetOutOfRange` for a bad context
	/// - `Error::TargetShape` for a target row of the wrong width
	/// - I/O errors from the checkpoint
	///
	/// # Notes
	/// With zero examples nothing happens: the model is untouched, the
	/// checkpoint is not written and the report shows zero epochs.
	pub fn train(
		&self,
		model: &mut WordModel,
		contexts: &[Vec<u32>],
		targets: &[Vec<f32>],
		mut checkpoint: Option<&mut BestCheckpoint>,
	) -> Result<TrainingReport> {
		let shape = model.shape();
		Self::check_examples(&shape, contexts, targets)?;

		let mut report = TrainingReport { examples: contexts.len(), ..Default::default() };
		if contexts.is_empty() {
			info!("No training windows, training skipped");
			return Ok(report);
		}

		let workers = self.config.effective_workers();
		info!(
			"Training on {} windows: {} parameters, {} epochs, batch {}, {} workers",
			contexts.len(),
			model.num_parameters(),
			self.config.epochs,
			self.config.batch_size,
			workers
		);

		let mut adam = Adam::new(&shape, self.config.learning_rate, self.config.beta1, self.config.beta2, self.config.epsilon);
		let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));
		let mut order: Vec<usize> = (0..contexts.len()).collect();

		for epoch in 1..=self.config.epochs {
			let started = Instant::now();
			order.shuffle(&mut rng);

			let mut total_loss = 0.0f64;
			for batch in order.chunks(self.config.batch_size) {
				let (mut grads, loss) = Self::batch_gradients(model, batch, contexts, targets, workers);
				grads.scale(1.0 / batch.len() as f32);
				adam.step(model.params_mut(), &grads);
				total_loss += loss as f64;
			}

			let epoch_loss = (total_loss / contexts.len() as f64) as f32;
			report.epoch_losses.push(epoch_loss);
			info!(
				"epoch {epoch}/{} - loss {epoch_loss:.4} ({} ms)",
				self.config.epochs,
				started.elapsed().as_millis()
			);

			if epoch % self.config.checkpoint_every == 0 {
				if let Some(checkpoint) = checkpoint.as_deref_mut() {
					if checkpoint.offer(epoch_loss, model)? {
						report.checkpoints_written += 1;
					}
				}
			}
		}

		report.steps = adam.steps();
		Ok(report)
	}

	fn check_examples(shape: &ModelShape, contexts: &[Vec<u32>], targets: &[Vec<f32>]) -> Result<()> {
		if contexts.len() != targets.len() {
			return Err(Error::LengthMismatch { contexts: contexts.len(), targets: targets.len() });
		}
		for context in contexts {
			check_context(context, shape.window_size, shape.vocab_size)?;
		}
		if let Some(row) = targets.iter().find(|row| row.len() != shape.vocab_size) {
			return Err(Error::TargetShape { expected: shape.vocab_size, got: row.len() });
		}
		Ok(())
	}

	/// Sums gradients and losses of the examples in `batch`.
	///
	/// The batch is split into one chunk per worker, each chunk accumulates
	/// its own gradients on a scoped thread, and the partial results are
	/// merged in chunk order.
	fn batch_gradients(
		model: &WordModel,
		batch: &[usize],
		contexts: &[Vec<u32>],
		targets: &[Vec<f32>],
		workers: usize,
	) -> (Parameters, f32) {
		let shape = model.shape();
		let accumulate = |chunk: &[usize]| {
			let mut grads = Parameters::zeros(&shape);
			let mut loss = 0.0f32;
			for &i in chunk {
				loss += model.accumulate_gradients(&contexts[i], &targets[i], &mut grads);
			}
			(grads, loss)
		};

		if workers <= 1 || batch.len() < 2 * workers {
			return accumulate(batch);
		}

		let chunk_size = batch.len().div_ceil(workers);
		let (tx, rx) = mpsc::channel();
		thread::scope(|s| {
			for (index, chunk) in batch.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				let accumulate = &accumulate;
				s.spawn(move || {
					let (grads, loss) = accumulate(chunk);
					// the receiver outlives the scope
					let _ = tx.send((index, grads, loss));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, Parameters, f32)> = rx.iter().collect();
		partials.sort_by_key(|(index, _, _)| *index);
		debug!("merging {} partial gradients", partials.len());

		let mut grads = Parameters::zeros(&shape);
		let mut loss = 0.0f32;
		for (_, partial, partial_loss) in &partials {
			grads.add_assign(partial);
			loss += partial_loss;
		}
		(grads, loss)
	}
}
