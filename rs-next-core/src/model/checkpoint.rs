use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;

use super::word_model::WordModel;

/// "Save best only" checkpoint keyed on training loss.
///
/// A new checkpoint is written iff the offered loss is strictly lower than
/// every loss offered before. The best loss starts at `+inf`, so the first
/// finite loss is always saved. NaN is never an improvement.
#[derive(Debug, Clone)]
pub struct BestCheckpoint {
	path: PathBuf,
	best_loss: f32,
	saves: usize,
}

impl BestCheckpoint {
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self { path: path.as_ref().to_path_buf(), best_loss: f32::INFINITY, saves: 0 }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Best loss seen so far, `None` before the first save.
	pub fn best_loss(&self) -> Option<f32> {
		if self.saves == 0 { None } else { Some(self.best_loss) }
	}

	/// Number of times the checkpoint file was written.
	pub fn saves(&self) -> usize {
		self.saves
	}

	/// Returns true if `loss` would replace the current checkpoint.
	pub fn improves(&self, loss: f32) -> bool {
		loss < self.best_loss
	}

	/// Offers a model with its loss, writing it if the loss improved.
	///
	/// # Returns
	/// `Ok(true)` if the checkpoint was written.
	///
	/// # Errors
	/// I/O or serialization errors from `WordModel::save`. The best loss is
	/// only updated once the file is written.
	pub fn offer(&mut self, loss: f32, model: &WordModel) -> Result<bool> {
		if !self.improves(loss) {
			debug!("loss {loss:.5} did not improve from {:.5}, checkpoint kept", self.best_loss);
			return Ok(false);
		}
		model.save(&self.path)?;
		info!("loss improved from {:.5} to {loss:.5}, saved {}", self.best_loss, self.path.display());
		self.best_loss = loss;
		self.saves += 1;
		Ok(true)
	}
}
