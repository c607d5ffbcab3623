use std::path::Path;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::write_atomic;

use super::classifier::{SequenceClassifier, check_context};
use super::ops::{cross_entropy, linear_bwd, linear_fwd, relu, softmax};

/// Dimensions of a `WordModel`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelShape {
	pub vocab_size: usize,
	pub window_size: usize,
	pub embedding_dim: usize,
	pub hidden_dim: usize,
}

impl ModelShape {
	/// Width of the concatenated context embeddings.
	pub fn input_dim(&self) -> usize {
		self.window_size * self.embedding_dim
	}

	fn validate(&self) -> Result<()> {
		if self.vocab_size == 0 || self.window_size == 0 || self.embedding_dim == 0 || self.hidden_dim == 0 {
			return Err(Error::InvalidConfig(format!("every model dimension must be > 0, got {self:?}")));
		}
		Ok(())
	}
}

/// All trainable tensors of a `WordModel`, as flat row-major buffers.
///
/// The same layout is reused for gradients and Adam moments.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Parameters {
	/// `vocab_size × embedding_dim`
	pub embedding: Vec<f32>,
	/// `hidden_dim × input_dim`
	pub w1: Vec<f32>,
	/// `hidden_dim`
	pub b1: Vec<f32>,
	/// `vocab_size × hidden_dim`
	pub w2: Vec<f32>,
	/// `vocab_size`
	pub b2: Vec<f32>,
}

impl Parameters {
	/// Zero-filled buffers for `shape`.
	pub fn zeros(shape: &ModelShape) -> Self {
		Self {
			embedding: vec![0.0; shape.vocab_size * shape.embedding_dim],
			w1: vec![0.0; shape.hidden_dim * shape.input_dim()],
			b1: vec![0.0; shape.hidden_dim],
			w2: vec![0.0; shape.vocab_size * shape.hidden_dim],
			b2: vec![0.0; shape.vocab_size],
		}
	}

	/// Embeddings uniform in `[-0.05, 0.05)`, dense weights Glorot-uniform, biases zero.
	fn random(shape: &ModelShape, rng: &mut StdRng) -> Self {
		let mut params = Self::zeros(shape);
		for v in params.embedding.iter_mut() {
			*v = rng.random_range(-0.05..0.05);
		}
		let limit = (6.0 / (shape.input_dim() + shape.hidden_dim) as f32).sqrt();
		for v in params.w1.iter_mut() {
			*v = rng.random_range(-limit..limit);
		}
		let limit = (6.0 / (shape.hidden_dim + shape.vocab_size) as f32).sqrt();
		for v in params.w2.iter_mut() {
			*v = rng.random_range(-limit..limit);
		}
		params
	}

	pub fn tensors(&self) -> [&[f32]; 5] {
		[&self.embedding, &self.w1, &self.b1, &self.w2, &self.b2]
	}

	pub fn tensors_mut(&mut self) -> [&mut [f32]; 5] {
		[&mut self.embedding, &mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2]
	}

	/// Element-wise `self += other`. Both sides must share a shape.
	pub fn add_assign(&mut self, other: &Self) {
		for (dst, src) in self.tensors_mut().into_iter().zip(other.tensors()) {
			for (d, s) in dst.iter_mut().zip(src) {
				*d += s;
			}
		}
	}

	pub fn scale(&mut self, factor: f32) {
		for tensor in self.tensors_mut() {
			for v in tensor.iter_mut() {
				*v *= factor;
			}
		}
	}

	pub fn len(&self) -> usize {
		self.tensors().iter().map(|t| t.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn matches(&self, shape: &ModelShape) -> bool {
		let expected = Self::zeros(shape);
		self.tensors().iter().zip(expected.tensors()).all(|(a, b)| a.len() == b.len())
	}
}

/// Intermediate values of one forward pass, kept for the backward pass.
struct Activations {
	input: Vec<f32>,
	hidden_pre: Vec<f32>,
	hidden: Vec<f32>,
	probs: Vec<f32>,
}

/// Feed-forward next-word classifier.
///
/// The `window_size` context embeddings are concatenated, go through one
/// ReLU hidden layer, then a dense output layer with softmax over the whole
/// vocabulary.
///
/// # Invariants
/// - every tensor in `params` has the length implied by `shape`
/// - the model is read-only once trained and can be shared across threads
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WordModel {
	shape: ModelShape,
	params: Parameters,
}

impl WordModel {
	/// Creates a model with seeded random weights.
	///
	/// # Errors
	/// Returns `Error::InvalidConfig` if a dimension is zero.
	pub fn new(shape: ModelShape, seed: u64) -> Result<Self> {
		shape.validate()?;
		let mut rng = StdRng::seed_from_u64(seed);
		let params = Parameters::random(&shape, &mut rng);
		Ok(Self { shape, params })
	}

	pub fn shape(&self) -> ModelShape {
		self.shape
	}

	pub fn params(&self) -> &Parameters {
		&self.params
	}

	pub(crate) fn params_mut(&mut self) -> &mut Parameters {
		&mut self.params
	}

	/// Total number of trainable scalars.
	pub fn num_parameters(&self) -> usize {
		self.params.len()
	}

	fn forward(&self, context: &[u32]) -> Activations {
		let ModelShape { vocab_size, embedding_dim, hidden_dim, .. } = self.shape;
		let input_dim = self.shape.input_dim();

		let mut input = vec![0.0; input_dim];
		for (k, &id) in context.iter().enumerate() {
			let row = id as usize * embedding_dim;
			input[k * embedding_dim..(k + 1) * embedding_dim]
				.copy_from_slice(&self.params.embedding[row..row + embedding_dim]);
		}

		let mut hidden_pre = vec![0.0; hidden_dim];
		linear_fwd(&input, &self.params.w1, &self.params.b1, hidden_dim, input_dim, &mut hidden_pre);
		let mut hidden = hidden_pre.clone();
		relu(&mut hidden);

		let mut logits = vec![0.0; vocab_size];
		linear_fwd(&hidden, &self.params.w2, &self.params.b2, vocab_size, hidden_dim, &mut logits);
		let mut probs = vec![0.0; vocab_size];
		softmax(&logits, &mut probs);

		Activations { input, hidden_pre, hidden, probs }
	}

	/// Runs forward and backward for one example and adds its gradients to `grads`.
	///
	/// `context` and `target` must already be checked against the shape.
	///
	/// # Returns
	/// The cross-entropy loss of the example.
	pub(crate) fn accumulate_gradients(&self, context: &[u32], target: &[f32], grads: &mut Parameters) -> f32 {
		let ModelShape { vocab_size, embedding_dim, hidden_dim, .. } = self.shape;
		let input_dim = self.shape.input_dim();
		let act = self.forward(context);
		let loss = cross_entropy(&act.probs, target);

		// softmax + cross-entropy
		let d_logits: Vec<f32> = act.probs.iter().zip(target).map(|(p, t)| p - t).collect();

		let mut d_hidden = vec![0.0; hidden_dim];
		linear_bwd(&d_logits, &act.hidden, &self.params.w2, vocab_size, hidden_dim, &mut d_hidden, &mut grads.w2, &mut grads.b2);
		for (d, &pre) in d_hidden.iter_mut().zip(&act.hidden_pre) {
			if pre <= 0.0 {
				*d = 0.0;
			}
		}

		let mut d_input = vec![0.0; input_dim];
		linear_bwd(&d_hidden, &act.input, &self.params.w1, hidden_dim, input_dim, &mut d_input, &mut grads.w1, &mut grads.b1);

		for (k, &id) in context.iter().enumerate() {
			let row = id as usize * embedding_dim;
			for e in 0..embedding_dim {
				grads.embedding[row + e] += d_input[k * embedding_dim + e];
			}
		}

		loss
	}

	/// Serializes the model with `postcard` and writes it atomically.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		write_atomic(&path, &bytes)?;
		debug!("Saved model ({} parameters) to {}", self.num_parameters(), path.as_ref().display());
		Ok(())
	}

	/// Restores a model written by `save`.
	///
	/// # Errors
	/// Returns `Error::CorruptModel` if the tensors do not match the stored shape.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		let model: Self = postcard::from_bytes(&bytes)?;
		model.shape.validate().map_err(|e| Error::CorruptModel(e.to_string()))?;
		if !model.params.matches(&model.shape) {
			return Err(Error::CorruptModel(format!("tensor sizes do not match {:?}", model.shape)));
		}
		Ok(model)
	}
}

impl SequenceClassifier for WordModel {
	fn window_size(&self) -> usize {
		self.shape.window_size
	}

	fn vocab_size(&self) -> usize {
		self.shape.vocab_size
	}

	fn predict_proba(&self, context: &[u32]) -> Result<Vec<f32>> {
		check_context(context, self.shape.window_size, self.shape.vocab_size)?;
		Ok(self.forward(context).probs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn shape() -> ModelShape {
		ModelShape { vocab_size: 6, window_size: 2, embedding_dim: 3, hidden_dim: 4 }
	}

	#[test]
	fn test_new_is_deterministic() {
		let a = WordModel::new(shape(), 7).unwrap();
		let b = WordModel::new(shape(), 7).unwrap();
		let c = WordModel::new(shape(), 8).unwrap();
		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(a.num_parameters(), 6 * 3 + 4 * 6 + 4 + 6 * 4 + 6);
	}

	#[test]
	fn test_rejects_zero_dimension() {
		let bad = ModelShape { hidden_dim: 0, ..shape() };
		assert!(matches!(WordModel::new(bad, 0), Err(Error::InvalidConfig(_))));
	}

	#[test]
	fn test_predict_proba_is_distribution() {
		let model = WordModel::new(shape(), 1).unwrap();
		let probs = model.predict_proba(&[1, 5]).unwrap();
		assert_eq!(probs.len(), 6);
		assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
		assert!(probs.iter().all(|&p| p > 0.0));
	}

	#[test]
	fn test_predict_proba_checks_context() {
		let model = WordModel::new(shape(), 1).unwrap();
		assert!(matches!(model.predict_proba(&[1, 2, 3]), Err(Error::ContextShape { .. })));
		assert!(matches!(model.predict_proba(&[1, 6]), Err(Error::TargetOutOfRange { id: 6, .. })));
	}

	fn set_param(model: &mut WordModel, tensor: usize, index: usize, value: f32) {
		let mut tensors = model.params_mut().tensors_mut();
		tensors[tensor][index] = value;
	}

	#[test]
	fn test_gradient_matches_finite_difference() {
		let mut model = WordModel::new(shape(), 3).unwrap();
		// keep every hidden unit active so the loss is smooth around the probes
		model.params_mut().b1.fill(1.0);
		let context = [2, 4];
		let target = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];

		let mut grads = Parameters::zeros(&model.shape());
		model.accumulate_gradients(&context, &target, &mut grads);

		let eps = 1e-2;
		let loss_at = |m: &WordModel| cross_entropy(&m.forward(&context).probs, &target);
		// one weight per tensor: embedding of id 2, first rows of w1/w2, biases
		let probes = [(0usize, 2 * 3 + 1), (1, 5), (2, 1), (3, 3 * 4 + 2), (4, 3)];
		for (tensor, index) in probes {
			let analytic = grads.tensors()[tensor][index];
			let original = model.params.tensors()[tensor][index];

			set_param(&mut model, tensor, index, original + eps);
			let plus = loss_at(&model);
			set_param(&mut model, tensor, index, original - eps);
			let minus = loss_at(&model);
			set_param(&mut model, tensor, index, original);

			let numeric = (plus - minus) / (2.0 * eps);
			assert!((analytic - numeric).abs() < 1e-2, "tensor {tensor}[{index}]: analytic {analytic}, numeric {numeric}");
		}
	}

	#[test]
	fn test_save_load_roundtrip() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("sherlock.model");
		let model = WordModel::new(shape(), 11).unwrap();
		model.save(&path).unwrap();

		let restored = WordModel::load(&path).unwrap();
		assert_eq!(restored, model);
		assert_eq!(restored.predict_proba(&[1, 2]).unwrap(), model.predict_proba(&[1, 2]).unwrap());
	}

	#[test]
	fn test_load_rejects_mismatched_tensors() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("broken.model");
		let mut model = WordModel::new(shape(), 11).unwrap();
		model.params.b2.pop();
		std::fs::write(&path, postcard::to_stdvec(&model).unwrap()).unwrap();
		assert!(matches!(WordModel::load(&path), Err(Error::CorruptModel(_))));
	}
}
