//! Learning side of the pipeline.
//!
//! - Sliding-window example generation (`window`)
//! - The model capability used by prediction (`SequenceClassifier`)
//! - A feed-forward next-word model (`WordModel`) and its trainer
//! - "Save best only" checkpointing
//! - Next-word prediction from free text

/// Fixed-width (context, target) windows and one-hot target expansion.
pub mod window;

/// The `SequenceClassifier` trait: context ids in, distribution out.
pub mod classifier;

/// Embedding + ReLU hidden layer + softmax output model.
///
/// Serializable with `postcard`; weights are plain `Vec<f32>`.
pub mod word_model;

/// Mini-batch training loop with parallel gradient accumulation.
pub mod trainer;

/// Best-loss checkpoint policy.
pub mod checkpoint;

/// Encode text, query a classifier, decode the winning id.
pub mod predictor;

/// Adam optimizer.
mod optimizer;

/// Dense math kernels.
mod ops;

pub use checkpoint::BestCheckpoint;
pub use classifier::SequenceClassifier;
pub use predictor::{encode_context, predict_next, predict_top_k};
pub use trainer::{Trained, Trainer, TrainingReport};
pub use window::{Window, generate, one_hot, one_hot_targets, split};
pub use word_model::{ModelShape, Parameters, WordModel};
