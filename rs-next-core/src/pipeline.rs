use std::path::{Path, PathBuf};

use log::info;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::io::{build_output_path, read_corpus, remove_if_exists};
use crate::model::{BestCheckpoint, SequenceClassifier, Trainer, TrainingReport, Window, WordModel};
use crate::model::{generate, one_hot_targets, split};
use crate::text::{Vocabulary, normalize};

/// Extension of a persisted vocabulary.
pub const VOCABULARY_EXTENSION: &str = "vocab";
/// Extension of the best-loss model checkpoint.
pub const MODEL_EXTENSION: &str = "model";

/// Everything derived from a corpus before training.
#[derive(Clone, Debug)]
pub struct TrainingSet {
	pub tokens: Vec<String>,
	pub vocabulary: Vocabulary,
	pub ids: Vec<u32>,
	pub windows: Vec<Window>,
}

impl TrainingSet {
	/// Contexts and one-hot targets ready for the trainer.
	pub fn examples(&self) -> Result<(Vec<Vec<u32>>, Vec<Vec<f32>>)> {
		let (contexts, targets) = split(&self.windows);
		let targets = one_hot_targets(&targets, self.vocabulary.size())?;
		Ok((contexts, targets))
	}
}

/// Output of `run_training`.
#[derive(Clone, Debug)]
pub struct TrainedArtifacts {
	pub vocabulary: Vocabulary,
	pub model: WordModel,
	pub report: TrainingReport,
	pub vocabulary_path: PathBuf,
	/// Written only if at least one epoch improved the loss. A model left
	/// there by an earlier run is removed first.
	pub model_path: PathBuf,
}

/// Normalizes `raw`, builds the vocabulary and slides windows of `window_size`.
///
/// # Errors
/// `Error::InvalidConfig` if `window_size` is zero.
pub fn prepare(raw: &str, window_size: usize) -> Result<TrainingSet> {
	if window_size == 0 {
		return Err(Error::InvalidConfig("window_size must be > 0".to_owned()));
	}

	let tokens = normalize(raw);
	let vocabulary = Vocabulary::build(&tokens);
	// every token is in the vocabulary it was built from
	let ids = vocabulary.encode(&tokens)?;
	let windows = generate(&ids, window_size);

	info!(
		"Prepared {} tokens, {} distinct, {} windows of {}",
		tokens.len(),
		vocabulary.len(),
		windows.len(),
		window_size
	);
	Ok(TrainingSet { tokens, vocabulary, ids, windows })
}

/// Full training run from a corpus file.
///
/// # Behavior
/// - Reads and prepares the corpus; any failure here aborts before anything
///   is written.
/// - Saves the vocabulary to `<output_dir>/<corpus stem>.vocab`.
/// - Removes any `<output_dir>/<corpus stem>.model` left by an earlier run:
///   its ids belong to a different vocabulary.
/// - Trains a new model, checkpointing the best epoch to
///   `<output_dir>/<corpus stem>.model`.
///
/// # Errors
/// `Error::CorpusNotFound` if `corpus_path` does not exist, configuration,
/// I/O and serialization errors otherwise.
pub fn run_training<P, D>(corpus_path: P, output_dir: D, config: &TrainingConfig) -> Result<TrainedArtifacts>
where
	P: AsRef<Path>,
	D: AsRef<Path>,
{
	config.validate()?;
	let trainer = Trainer::new(config.clone())?;

	let raw = read_corpus(&corpus_path)?;
	let set = prepare(&raw, config.window_size)?;
	let (contexts, targets) = set.examples()?;

	let vocabulary_path = build_output_path(&corpus_path, &output_dir, VOCABULARY_EXTENSION)?;
	let model_path = build_output_path(&corpus_path, &output_dir, MODEL_EXTENSION)?;

	set.vocabulary.save(&vocabulary_path)?;
	info!("Vocabulary saved to {}", vocabulary_path.display());
	if remove_if_exists(&model_path)? {
		info!("Removed previous model {}", model_path.display());
	}

	let mut checkpoint = BestCheckpoint::new(&model_path);
	let trained = trainer.fit(&contexts, &targets, set.vocabulary.size(), Some(&mut checkpoint))?;

	Ok(TrainedArtifacts {
		vocabulary: set.vocabulary,
		model: trained.model,
		report: trained.report,
		vocabulary_path,
		model_path,
	})
}

/// Restores a vocabulary and a model saved by an earlier run.
///
/// # Errors
/// `Error::VocabularyMismatch` if the model was not trained with this vocabulary.
pub fn load_artifacts<V, M>(vocabulary_path: V, model_path: M) -> Result<(Vocabulary, WordModel)>
where
	V: AsRef<Path>,
	M: AsRef<Path>,
{
	let vocabulary = Vocabulary::load(vocabulary_path)?;
	let model = WordModel::load(model_path)?;
	if model.vocab_size() != vocabulary.size() {
		return Err(Error::VocabularyMismatch { vocabulary: vocabulary.size(), model: model.vocab_size() });
	}
	Ok((vocabulary, model))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_prepare_reference_corpus() {
		let set = prepare("Once upon a time there was a", 3).unwrap();
		assert_eq!(set.tokens.len(), 7);
		assert_eq!(set.vocabulary.size(), 7);
		assert_eq!(set.ids, vec![1, 2, 3, 4, 5, 6, 3]);
		assert_eq!(set.windows.len(), 4);

		let (contexts, targets) = set.examples().unwrap();
		assert_eq!(contexts[3], vec![4, 5, 6]);
		assert_eq!(targets[3], vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
	}

	#[test]
	fn test_prepare_empty_corpus() {
		let set = prepare("", 3).unwrap();
		assert!(set.tokens.is_empty());
		assert_eq!(set.vocabulary.size(), 1);
		assert!(set.windows.is_empty());
		let (contexts, targets) = set.examples().unwrap();
		assert!(contexts.is_empty() && targets.is_empty());
	}

	#[test]
	fn test_prepare_rejects_zero_window() {
		assert!(matches!(prepare("a b c", 0), Err(Error::InvalidConfig(_))));
	}

	#[test]
	fn test_missing_corpus_writes_nothing() {
		let dir = TempDir::new().unwrap();
		let out = dir.path().join("out");
		let result = run_training(dir.path().join("missing.txt"), &out, &TrainingConfig::default());
		assert!(matches!(result, Err(Error::CorpusNotFound(_))));
		assert!(!out.exists());
	}

	#[test]
	fn test_invalid_config_writes_nothing() {
		let dir = TempDir::new().unwrap();
		let corpus = dir.path().join("corpus.txt");
		std::fs::write(&corpus, "a b c d e").unwrap();
		let config = TrainingConfig { batch_size: 0, ..Default::default() };

		assert!(matches!(run_training(&corpus, dir.path(), &config), Err(Error::InvalidConfig(_))));
		assert!(!dir.path().join("corpus.vocab").exists());
	}

	#[test]
	fn test_retraining_drops_previous_model() {
		let dir = TempDir::new().unwrap();
		let corpus = dir.path().join("corpus.txt");
		let config = TrainingConfig { window_size: 1, embedding_dim: 2, hidden_dim: 4, workers: 1, ..Default::default() };

		std::fs::write(&corpus, "x y y y").unwrap();
		let first = run_training(&corpus, dir.path(), &config).unwrap();
		assert!(first.report.checkpoints_written >= 1);
		assert!(first.model_path.exists());

		// same vocabulary size, no windows to train on
		std::fs::write(&corpus, "p q").unwrap();
		let second = run_training(&corpus, dir.path(), &config).unwrap();
		assert_eq!(second.report.epochs_run(), 0);
		assert_eq!(second.vocabulary.size(), first.vocabulary.size());
		assert!(!second.model_path.exists());
		assert!(matches!(load_artifacts(&second.vocabulary_path, &second.model_path), Err(Error::Io(_))));
	}

	#[test]
	fn test_retraining_without_checkpoint_drops_previous_model() {
		let dir = TempDir::new().unwrap();
		let corpus = dir.path().join("corpus.txt");
		std::fs::write(&corpus, "a b c a b c").unwrap();
		let config = TrainingConfig { window_size: 1, embedding_dim: 2, hidden_dim: 4, workers: 1, ..Default::default() };
		assert!(run_training(&corpus, dir.path(), &config).unwrap().model_path.exists());

		let sparse = TrainingConfig { checkpoint_every: 10, ..config };
		let again = run_training(&corpus, dir.path(), &sparse).unwrap();
		assert_eq!(again.report.checkpoints_written, 0);
		assert!(!again.model_path.exists());
	}

	#[test]
	fn test_load_artifacts_detects_mismatch() {
		let dir = TempDir::new().unwrap();
		let vocab_path = dir.path().join("a.vocab");
		let model_path = dir.path().join("a.model");
		Vocabulary::build(["a", "b"]).save(&vocab_path).unwrap();
		let shape = crate::model::ModelShape { vocab_size: 5, window_size: 1, embedding_dim: 2, hidden_dim: 2 };
		WordModel::new(shape, 0).unwrap().save(&model_path).unwrap();

		assert!(matches!(
			load_artifacts(&vocab_path, &model_path),
			Err(Error::VocabularyMismatch { vocabulary: 3, model: 5 })
		));
	}
}
