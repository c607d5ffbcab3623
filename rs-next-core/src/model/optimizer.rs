use super::word_model::{ModelShape, Parameters};

/// Adam optimizer state for one `WordModel`.
///
/// Moments share the parameter layout; bias corrections are computed once
/// per step, not per parameter.
#[derive(Clone, Debug)]
pub struct Adam {
	learning_rate: f32,
	beta1: f32,
	beta2: f32,
	epsilon: f32,
	m: Parameters,
	v: Parameters,
	step: usize,
}

impl Adam {
	pub fn new(shape: &ModelShape, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
		Self {
			learning_rate,
			beta1,
			beta2,
			epsilon,
			m: Parameters::zeros(shape),
			v: Parameters::zeros(shape),
			step: 0,
		}
	}

	/// Number of updates applied so far.
	pub fn steps(&self) -> usize {
		self.step
	}

	/// Applies one update to `params` from the (already averaged) `grads`.
	pub fn step(&mut self, params: &mut Parameters, grads: &Parameters) {
		self.step += 1;
		let t = self.step as i32;
		let bc1 = 1.0 - self.beta1.powi(t);
		let bc2 = 1.0 - self.beta2.powi(t);

		let tensors = params
			.tensors_mut()
			.into_iter()
			.zip(grads.tensors())
			.zip(self.m.tensors_mut())
			.zip(self.v.tensors_mut());
		for (((p, g), m), v) in tensors {
			adam_update(p, g, m, v, self.beta1, self.beta2, bc1, bc2, self.learning_rate, self.epsilon);
		}
	}
}

#[allow(clippy::too_many_arguments)]
fn adam_update(
	params: &mut [f32],
	grads: &[f32],
	m: &mut [f32],
	v: &mut [f32],
	beta1: f32,
	beta2: f32,
	bc1: f32,
	bc2: f32,
	lr: f32,
	epsilon: f32,
) {
	for i in 0..params.len() {
		m[i] = beta1 * m[i] + (1.0 - beta1) * grads[i];
		v[i] = beta2 * v[i] + (1.0 - beta2) * grads[i] * grads[i];
		let m_hat = m[i] / bc1;
		let v_hat = v[i] / bc2;
		params[i] -= lr * m_hat / (v_hat.sqrt() + epsilon);
	}
}
