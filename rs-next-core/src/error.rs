//! Error types shared by the whole pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing a corpus, training, persisting or predicting.
///
/// Preprocessing errors (`CorpusNotFound`, `InvalidConfig`, `Io` while reading)
/// abort a training run before anything is written to disk. Prediction errors
/// are per request and never touch persisted artifacts.
#[derive(Debug, Error)]
pub enum Error {
	#[error("Corpus not found: {}", .0.display())]
	CorpusNotFound(PathBuf),

	#[error("Unknown token: {0:?}")]
	UnknownToken(String),

	/// The model's argmax has no token attached. Structurally impossible when
	/// the model and vocabulary sizes agree, so this is an internal failure.
	#[error("No token matches predicted id {0}")]
	EmptyPrediction(u32),

	#[error("Context too short: need {needed} tokens, got {got}")]
	ContextTooShort { needed: usize, got: usize },

	#[error("Context has {got} ids, model expects {expected}")]
	ContextShape { expected: usize, got: usize },

	#[error("Id {id} out of range for vocabulary size {vocab_size}")]
	TargetOutOfRange { id: u32, vocab_size: usize },

	#[error("Target row has width {got}, expected {expected}")]
	TargetShape { expected: usize, got: usize },

	#[error("Length mismatch: {contexts} contexts, {targets} targets")]
	LengthMismatch { contexts: usize, targets: usize },

	#[error("Vocabulary size {vocabulary} does not match model size {model}")]
	VocabularyMismatch { vocabulary: usize, model: usize },

	#[error("Corrupt vocabulary: {0}")]
	CorruptVocabulary(String),

	#[error("Corrupt model: {0}")]
	CorruptModel(String),

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("Configuration error: {0}")]
	Config(#[from] serde_json::Error),
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
