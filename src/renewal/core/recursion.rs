//! recursion — renewal simulation, delay convolution and exposure clipping.
//!
//! Purpose
//! -------
//! Numerical building blocks of the generative model, each paired with its
//! vector-Jacobian product so the graph can accumulate exact gradients in
//! reverse mode.
//!
//! Key behaviors
//! -------------
//! - [`simulate_infections`]: the renewal recursion as a sequential fold that
//!   carries the running infections vector. Each step dots only the kernel
//!   band, so total work is `O(N · window)`.
//! - [`convolve_truncated`]: full linear convolution truncated to the input
//!   length (the reporting delay and the "still active" weighting).
//! - [`clip`]: elementwise clamp used for exposure.
//!
//! Invariants & assumptions
//! ------------------------
//! - `infections[0] = seed`, and `infections[t] >= 0` whenever the seed,
//!   `r_t` and kernel weights are non-negative.
//! - `r_t[0]` never enters the recursion; its gradient is always zero.
//!
//! Testing notes
//! -------------
//! - VJPs are checked against central finite differences of the forward
//!   functions; positivity is property-tested.
use ndarray::{s, Array1, ArrayView1};

use crate::renewal::core::kernel::GenerationTimeKernel;

/// Run the renewal recursion.
///
/// ```text
/// infections[0] = seed
/// infections[t] = r_t[t] · Σ_{j ∈ band(t)} K[t-1, j] · infections[j]
/// ```
///
/// `r_t` must have length `kernel.n_days()`.
pub fn simulate_infections(
    kernel: &GenerationTimeKernel, seed: f64, r_t: ArrayView1<'_, f64>,
) -> Array1<f64> {
    let n = kernel.n_days();
    let mut init = Array1::zeros(n);
    init[0] = seed;
    (1..n).fold(init, |mut infections, t| {
        let band = kernel.band(t);
        let pressure = kernel.band_weights(t).dot(&infections.slice(s![band]));
        infections[t] = r_t[t] * pressure;
        infections
    })
}

/// Reverse-mode pass of [`simulate_infections`].
///
/// Given the forward output `infections` and the adjoint `adj` of the loss
/// w.r.t. each `infections[t]`, returns `(d loss / d seed, d loss / d r_t)`.
pub fn simulate_infections_vjp(
    kernel: &GenerationTimeKernel, r_t: ArrayView1<'_, f64>, infections: ArrayView1<'_, f64>,
    adj: ArrayView1<'_, f64>,
) -> (f64, Array1<f64>) {
    let n = kernel.n_days();
    let mut adj_infections = adj.to_owned();
    let mut adj_r = Array1::zeros(n);
    for t in (1..n).rev() {
        let band = kernel.band(t);
        let weights = kernel.band_weights(t);
        let pressure = weights.dot(&infections.slice(s![band.clone()]));
        adj_r[t] = adj_infections[t] * pressure;
        let upstream = adj_infections[t] * r_t[t];
        adj_infections.slice_mut(s![band]).scaled_add(upstream, &weights);
    }
    (adj_infections[0], adj_r)
}

/// Full linear convolution of `x` with `kernel`, truncated to `x.len()`.
///
/// `out[t] = Σ_{k=0}^{min(t, len(kernel)-1)} x[t - k] · kernel[k]`
pub fn convolve_truncated(x: ArrayView1<'_, f64>, kernel: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = x.len();
    Array1::from_shape_fn(n, |t| {
        let taps = kernel.len().min(t + 1);
        (0..taps).map(|k| x[t - k] * kernel[k]).sum()
    })
}

/// Reverse-mode pass of [`convolve_truncated`] w.r.t. `x` (a truncated
/// cross-correlation of the adjoint with the kernel).
pub fn convolve_truncated_vjp(adj: ArrayView1<'_, f64>, kernel: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = adj.len();
    Array1::from_shape_fn(n, |i| {
        let taps = kernel.len().min(n - i);
        (0..taps).map(|k| adj[i + k] * kernel[k]).sum()
    })
}

/// Clamp every element to `[lower, upper]`: the floor is applied first and
/// the cap second, so the cap wins if the bounds cross.
pub fn clip(x: ArrayView1<'_, f64>, lower: f64, upper: f64) -> Array1<f64> {
    x.mapv(|v| v.max(lower).min(upper))
}

/// Reverse-mode pass of [`clip`]: gradients pass only where the input was
/// strictly inside the bounds.
pub fn clip_vjp(x: ArrayView1<'_, f64>, adj: ArrayView1<'_, f64>, lower: f64, upper: f64) -> Array1<f64> {
    Array1::from_shape_fn(x.len(), |i| if x[i] > lower && x[i] < upper { adj[i] } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renewal::core::pmf::Pmf;
    use ndarray::array;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Renewal recursion values on a hand-computed case.
    // - Zero-kernel boundary behavior.
    // - VJPs agree with central differences.
    // - Non-negativity for arbitrary non-negative inputs.
    // -------------------------------------------------------------------------

    fn kernel(weights: &[f64], n: usize) -> GenerationTimeKernel {
        let gt = Pmf::new("p_generation_time", weights).expect("valid pmf");
        GenerationTimeKernel::new(&gt, n).expect("kernel should build")
    }

    fn central<F: Fn(&Array1<f64>) -> f64>(f: F, x: &Array1<f64>) -> Array1<f64> {
        let h = 1e-6;
        Array1::from_shape_fn(x.len(), |i| {
            let mut up = x.clone();
            let mut down = x.clone();
            up[i] += h;
            down[i] -= h;
            (f(&up) - f(&down)) / (2.0 * h)
        })
    }

    #[test]
    // Purpose
    // -------
    // Check the recursion against a hand-computed trajectory.
    //
    // Given
    // -----
    // - gt = [0, 0.5, 0.5], seed = 2, r_t = [9, 1, 2, 1].
    //
    // Expect
    // ------
    // - i1 = 1 · 0.5·2 = 1
    // - i2 = 2 · (0.5·1 + 0.5·2) = 3
    // - i3 = 1 · (0.5·3 + 0.5·1) = 2
    fn simulate_infections_matches_hand_computation() {
        let k = kernel(&[0.0, 0.5, 0.5], 4);
        let r_t = array![9.0, 1.0, 2.0, 1.0];

        let infections = simulate_infections(&k, 2.0, r_t.view());

        assert_eq!(infections, array![2.0, 1.0, 3.0, 2.0]);
    }

    #[test]
    // Purpose
    // -------
    // All mass on day 0 means nobody is ever infected after the seed.
    //
    // Given
    // -----
    // - gt = [1.0], seed = 5, large r_t.
    //
    // Expect
    // ------
    // - infections = [5, 0, 0, 0, 0].
    fn zero_kernel_leaves_only_the_seed() {
        let k = kernel(&[1.0], 5);
        let r_t = Array1::from_elem(5, 40.0);

        let infections = simulate_infections(&k, 5.0, r_t.view());

        assert_eq!(infections, array![5.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // The renewal VJP matches finite differences of a weighted sum.
    //
    // Given
    // -----
    // - A 10-day axis, the reference gt and a wiggly r_t.
    // - Loss = Σ w_t · infections[t] with fixed weights.
    //
    // Expect
    // ------
    // - d/d seed and d/d r_t agree with central differences (rel. 1e-5).
    fn simulate_infections_vjp_matches_central_differences() {
        let k = kernel(&[0.0, 0.2, 0.3, 0.3, 0.2], 10);
        let r_t = Array1::from_shape_fn(10, |i| 1.0 + 0.1 * (i as f64).sin());
        let w = Array1::from_shape_fn(10, |i| 0.5 + i as f64 * 0.1);
        let seed = 1.3;

        let infections = simulate_infections(&k, seed, r_t.view());
        let (d_seed, d_r) = simulate_infections_vjp(&k, r_t.view(), infections.view(), w.view());

        let fd_r = central(|r| simulate_infections(&k, seed, r.view()).dot(&w), &r_t);
        let fd_seed = central(
            |s| simulate_infections(&k, s[0], r_t.view()).dot(&w),
            &array![seed],
        );
        assert!((d_seed - fd_seed[0]).abs() < 1e-5 * fd_seed[0].abs().max(1.0));
        for (a, b) in d_r.iter().zip(fd_r.iter()) {
            assert!((a - b).abs() < 1e-5 * b.abs().max(1.0), "{a} vs {b}");
        }
        assert_eq!(d_r[0], 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Truncated convolution and its VJP are consistent.
    //
    // Given
    // -----
    // - x of length 6 and the reference delay [0.1, 0.4, 0.3, 0.2].
    //
    // Expect
    // ------
    // - out[0] = 0.1·x[0], out[1] = 0.1·x[1] + 0.4·x[0].
    // - VJP agrees with finite differences of Σ w · out.
    fn convolve_truncated_and_vjp_agree() {
        let x = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let delay = array![0.1, 0.4, 0.3, 0.2];
        let w = array![1.0, -1.0, 0.5, 2.0, 0.3, 1.5];

        let out = convolve_truncated(x.view(), delay.view());
        let vjp = convolve_truncated_vjp(w.view(), delay.view());
        let fd = central(|v| convolve_truncated(v.view(), delay.view()).dot(&w), &x);

        assert_eq!(out.len(), 6);
        assert!((out[0] - 0.1).abs() < 1e-12);
        assert!((out[1] - 0.6).abs() < 1e-12);
        for (a, b) in vjp.iter().zip(fd.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Clip keeps values inside its bounds and only passes interior gradients.
    //
    // Given
    // -----
    // - x = [1, 50, 2e9] with bounds [10, 1e9].
    //
    // Expect
    // ------
    // - [10, 50, 1e9] and gradient mask [0, 1, 0].
    fn clip_bounds_values_and_gradients() {
        let x = array![1.0, 50.0, 2e9];

        let clipped = clip(x.view(), 10.0, 1e9);
        let grad = clip_vjp(x.view(), array![1.0, 1.0, 1.0].view(), 10.0, 1e9);

        assert_eq!(clipped, array![10.0, 50.0, 1e9]);
        assert_eq!(grad, array![0.0, 1.0, 0.0]);
    }

    proptest! {
        #[test]
        fn infections_stay_non_negative(
            seed in 0.0f64..10.0,
            log_r in prop::collection::vec(-1.0f64..1.0, 2..40),
            gt in prop::collection::vec(0.0f64..1.0, 1..8),
        ) {
            let n = log_r.len();
            let k = kernel(&gt, n);
            let r_t = Array1::from(log_r).mapv(f64::exp);

            let infections = simulate_infections(&k, seed, r_t.view());

            prop_assert_eq!(infections[0], seed);
            prop_assert!(infections.iter().all(|&v| v >= 0.0));
        }
    }
}
