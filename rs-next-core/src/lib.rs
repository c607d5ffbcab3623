//! Word-level next-word prediction library.
//!
//! This crate provides the whole corpus-to-prediction pipeline:
//! - Corpus normalization and whitespace tokenization
//! - A frozen, persistable token ↔ id vocabulary
//! - Sliding-window (context, target) example generation
//! - A trainable feed-forward next-word model with "save best only" checkpoints
//! - Next-word prediction from free text
//!
//! ```no_run
//! use rs_next_core::config::TrainingConfig;
//! use rs_next_core::model::predict_next;
//! use rs_next_core::pipeline::run_training;
//!
//! let artifacts = run_training("data/sherlock.txt", "data", &TrainingConfig::default())?;
//! let word = predict_next(&artifacts.model, &artifacts.vocabulary, "Once in a")?;
//! println!("{word}");
//! # Ok::<(), rs_next_core::Error>(())
//! ```

/// Text normalization and vocabulary.
pub mod text;

/// Windows, model, training, checkpointing and prediction.
pub mod model;

/// Corpus-file to persisted-artifacts orchestration.
pub mod pipeline;

/// Training hyperparameters.
pub mod config;

/// Crate error type.
pub mod error;

/// I/O utilities (corpus loading, output paths, atomic writes).
pub mod io;

pub use error::{Error, Result};
