use std::fs;

use tempfile::TempDir;

use rs_next_core::Error;
use rs_next_core::config::TrainingConfig;
use rs_next_core::model::{SequenceClassifier, predict_next, predict_top_k};
use rs_next_core::pipeline::{load_artifacts, run_training};

const PANGRAM: &str = "the quick brown fox jumps over the lazy dog";

fn config() -> TrainingConfig {
	TrainingConfig {
		embedding_dim: 8,
		hidden_dim: 32,
		epochs: 300,
		batch_size: 8,
		learning_rate: 0.01,
		workers: 2,
		..Default::default()
	}
}

fn write_corpus(dir: &TempDir) -> std::path::PathBuf {
	let path = dir.path().join("pangram.txt");
	let body = vec![PANGRAM; 10].join("\r\n");
	fs::write(&path, format!("\u{feff}{body}")).unwrap();
	path
}

#[test]
fn train_persist_reload_predict() {
	let dir = TempDir::new().unwrap();
	let corpus = write_corpus(&dir);
	let out = dir.path().join("out");

	let artifacts = run_training(&corpus, &out, &config()).unwrap();
	assert_eq!(artifacts.vocabulary.size(), 9);
	assert_eq!(artifacts.report.examples, 87);
	assert_eq!(artifacts.vocabulary_path, out.join("pangram.vocab"));
	assert_eq!(artifacts.model_path, out.join("pangram.model"));
	assert!(artifacts.report.checkpoints_written >= 1);

	assert_eq!(predict_next(&artifacts.model, &artifacts.vocabulary, "quick brown fox").unwrap(), "jumps");

	// a later session only has the files
	let (vocabulary, model) = load_artifacts(&artifacts.vocabulary_path, &artifacts.model_path).unwrap();
	assert_eq!(vocabulary, artifacts.vocabulary);
	assert_eq!(model.vocab_size(), 9);
	assert_eq!(predict_next(&model, &vocabulary, "over the lazy").unwrap(), "dog");
	assert_eq!(predict_next(&model, &vocabulary, "lazy dog the").unwrap(), "quick");
	// longer input: only the last three words count
	assert_eq!(predict_next(&model, &vocabulary, "the quick brown fox jumps over").unwrap(), "the");

	let top = predict_top_k(&model, &vocabulary, "brown fox jumps", 3).unwrap();
	assert_eq!(top.len(), 3);
	assert_eq!(top[0].0, "over");
	assert!(top[0].1 >= top[1].1 && top[1].1 >= top[2].1);
}

#[test]
fn prediction_failures_do_not_touch_artifacts() {
	let dir = TempDir::new().unwrap();
	let corpus = write_corpus(&dir);
	let config = TrainingConfig { epochs: 2, ..config() };
	let artifacts = run_training(&corpus, dir.path(), &config).unwrap();
	let before = fs::read(&artifacts.model_path).unwrap();

	let err = predict_next(&artifacts.model, &artifacts.vocabulary, "the quick cat").unwrap_err();
	assert!(matches!(err, Error::UnknownToken(ref t) if t == "cat"));

	let err = predict_next(&artifacts.model, &artifacts.vocabulary, "The quick brown").unwrap_err();
	assert!(matches!(err, Error::UnknownToken(ref t) if t == "The"));

	let err = predict_next(&artifacts.model, &artifacts.vocabulary, "fox").unwrap_err();
	assert!(matches!(err, Error::ContextTooShort { needed: 3, got: 1 }));

	assert_eq!(fs::read(&artifacts.model_path).unwrap(), before);
}

#[test]
fn empty_corpus_trains_nothing() {
	let dir = TempDir::new().unwrap();
	let corpus = dir.path().join("empty.txt");
	fs::write(&corpus, "").unwrap();

	let artifacts = run_training(&corpus, dir.path(), &config()).unwrap();
	assert_eq!(artifacts.vocabulary.size(), 1);
	assert_eq!(artifacts.report.examples, 0);
	assert_eq!(artifacts.report.epochs_run(), 0);
	assert!(artifacts.vocabulary_path.exists());
	assert!(!artifacts.model_path.exists());
}

#[test]
fn missing_corpus_is_reported() {
	let dir = TempDir::new().unwrap();
	let err = run_training(dir.path().join("Sherlock Holmes.txt"), dir.path(), &config()).unwrap_err();
	assert!(matches!(err, Error::CorpusNotFound(_)));
}
