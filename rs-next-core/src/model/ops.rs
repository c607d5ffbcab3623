//! Dense math primitives used by `WordModel`.
//!
//! Matrices are flat row-major `f32` slices: `w[r * nin + c]` is row `r`,
//! column `c`.

/// Linear forward: `out[nout] = W[nout × nin] · x[nin] + b[nout]`.
pub fn linear_fwd(x: &[f32], w: &[f32], b: &[f32], nout: usize, nin: usize, out: &mut [f32]) {
	for r in 0..nout {
		// zip-based dot product, auto-vectorized
		out[r] = w[r * nin..(r + 1) * nin].iter().zip(x.iter()).map(|(wi, xi)| wi * xi).sum::<f32>() + b[r];
	}
}

/// Linear backward.
///
/// - `d_w[r, c] += d_out[r] * x[c]`
/// - `d_b[r] += d_out[r]`
/// - `d_x[c] = Σ_r d_out[r] * w[r, c]` (overwritten, not accumulated)
#[allow(clippy::too_many_arguments)]
pub fn linear_bwd(
	d_out: &[f32],
	x: &[f32],
	w: &[f32],
	nout: usize,
	nin: usize,
	d_x: &mut [f32],
	d_w: &mut [f32],
	d_b: &mut [f32],
) {
	d_x[..nin].fill(0.0);
	for r in 0..nout {
		let g = d_out[r];
		if g == 0.0 {
			continue;
		}
		d_b[r] += g;
		let row = r * nin;
		for c in 0..nin {
			d_w[row + c] += g * x[c];
			d_x[c] += g * w[row + c];
		}
	}
}

/// In-place ReLU.
pub fn relu(x: &mut [f32]) {
	for v in x.iter_mut() {
		if *v < 0.0 {
			*v = 0.0;
		}
	}
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32], probs: &mut [f32]) {
	let mx = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
	let mut sum = 0.0f32;
	for (p, &l) in probs.iter_mut().zip(logits) {
		*p = (l - mx).exp();
		sum += *p;
	}
	let inv = 1.0 / sum;
	for p in probs.iter_mut() {
		*p *= inv;
	}
}

/// Categorical cross-entropy of `probs` against a target distribution.
pub fn cross_entropy(probs: &[f32], target: &[f32]) -> f32 {
	probs
		.iter()
		.zip(target)
		.filter(|&(_, &t)| t != 0.0)
		.map(|(&p, &t)| -t * p.max(1e-10).ln())
		.sum()
}

/// Index of the largest value, lowest index on ties.
///
/// NaN never wins. Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;
	for (i, &v) in values.iter().enumerate() {
		if v.is_nan() {
			continue;
		}
		match best {
			Some((_, b)) if v <= b => {}
			_ => best = Some((i, v)),
		}
	}
	best.map(|(i, _)| i).or(if values.is_empty() { None } else { Some(0) })
}
