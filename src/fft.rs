//! Complex FFT over cyclotomic rings (§4.5).
//!
//! Forward/inverse transforms for `Z[x]/(x^n+1)` represent a real
//! coefficient vector of length `n` as `n/2` complex numbers (the upper
//! half of the `2n`-th roots of unity; the lower half is the complex
//! conjugate by the realness of the input). All pointwise ring operations
//! then reduce to elementwise complex arithmetic on that packed
//! representation, which is what gives table-build and convolution code
//! in the sampling layer its speed.
//!
//! Grounded in `original_source/src/utils/arith/falcon_fft.c`; ported
//! here onto `num_complex::Complex64` (see SPEC_FULL.md §4.5) rather than
//! a hand-rolled complex type, since `num-complex` is exactly the kind of
//! thin audit-friendly arithmetic struct the corpus reaches for alongside
//! a finite-field crate.
//!
//! The trinomial ring `X^n - X^(n/2) + 1`'s FFT3 family
//! ([`split_top`]/[`merge_top`], [`split_deep`]/[`merge_deep`]) is a
//! separate, smaller transform over the same packed representation,
//! using the sixth-root-of-unity constants [`W1`]/[`W2`] rather than the
//! cyclotomic ring's `2n`-th roots.

use num_complex::Complex64;
use std::f64::consts::PI;

/// The packed FFT-domain representation of a degree-`n` real polynomial
/// in `Z[x]/(x^n+1)`: `n/2` complex samples at the odd `2n`-th roots of
/// unity `exp(i*pi*(2j+1)/n)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CycloFft {
    n: usize,
    data: Vec<Complex64>,
}

impl CycloFft {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn n(&self) -> usize {
        self.n
    }
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    fn same_ring(a: &CycloFft, b: &CycloFft) {
        assert_eq!(a.n, b.n, "FFT operands must share a ring dimension");
    }

    /// Forward transform: real coefficients (length `n`, `n` a power of
    /// two) to `n/2` packed complex samples.
    pub fn forward(coeffs: &[f64]) -> CycloFft {
        let n = coeffs.len();
        assert!(n.is_power_of_two() && n >= 2, "cyclotomic FFT requires a power-of-two length >= 2");
        // Twist by the half-sample phase exp(i*pi*k/n), then take an
        // ordinary size-n DFT; the first n/2 outputs are independent by
        // conjugate symmetry since the input is real.
        let twisted: Vec<Complex64> = coeffs
            .iter()
            .enumerate()
            .map(|(k, &c)| Complex64::new(c, 0.0) * Complex64::from_polar(1.0, PI * k as f64 / n as f64))
            .collect();
        let full = dft(&twisted, false);
        CycloFft { n, data: full[..n / 2].to_vec() }
    }

    /// Inverse transform: recover the `n` real coefficients.
    pub fn inverse(&self) -> Vec<f64> {
        let n = self.n;
        let mut full = vec![Complex64::new(0.0, 0.0); n];
        for j in 0..n / 2 {
            full[j] = self.data[j];
            full[n - 1 - j] = self.data[j].conj();
        }
        let g = dft(&full, true);
        g.iter()
            .enumerate()
            .map(|(k, c)| (c * Complex64::from_polar(1.0, -PI * k as f64 / n as f64)).re)
            .collect()
    }

    pub fn add(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x + y).collect() }
    }

    pub fn sub(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x - y).collect() }
    }

    pub fn neg(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| -x).collect() }
    }

    pub fn mul(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x * y).collect() }
    }

    /// `a * conj(b)`, elementwise.
    pub fn muladj(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x * y.conj()).collect() }
    }

    pub fn sqr(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| x * x).collect() }
    }

    /// `a * conj(a) = |a|^2`, real-valued in each slot.
    pub fn mulselfadj(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| Complex64::new(x.norm_sqr(), 0.0)).collect() }
    }

    pub fn adj(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| x.conj()).collect() }
    }

    pub fn inv(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| x.inv()).collect() }
    }

    pub fn div(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x / y).collect() }
    }

    /// `a / conj(b)`, elementwise.
    pub fn divadj(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        CycloFft { n: a.n, data: a.data.iter().zip(&b.data).map(|(x, y)| x / y.conj()).collect() }
    }

    /// Elementwise product, for operands already known to be self-adjoint
    /// (real-valued in this representation); identical arithmetic to
    /// [`CycloFft::mul`], kept as a distinct entry point so call sites can
    /// document the self-adjoint precondition they rely on.
    pub fn mul_autoadj(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::mul(a, b)
    }

    pub fn div_autoadj(a: &CycloFft, b: &CycloFft) -> CycloFft {
        Self::div(a, b)
    }

    /// `1 / (a * conj(a))`, elementwise, real-valued.
    pub fn invnorm2(a: &CycloFft) -> CycloFft {
        CycloFft { n: a.n, data: a.data.iter().map(|x| Complex64::new(1.0 / x.norm_sqr(), 0.0)).collect() }
    }

    /// `a + b * conj(c)`, fused elementwise (the Gram-matrix update used
    /// throughout the sampling layer's table construction).
    pub fn add_muladj(a: &CycloFft, b: &CycloFft, c: &CycloFft) -> CycloFft {
        Self::same_ring(a, b);
        Self::same_ring(b, c);
        CycloFft { n: a.n, data: a.data.iter().zip(b.data.iter().zip(&c.data)).map(|(x, (y, z))| x + y * z.conj()).collect() }
    }
}

/// `W1 = exp(i*pi/3)`, the sixth root of unity used by the trinomial
/// ring `X^n - X^(n/2) + 1`'s FFT3 family (§4.5 ¶2).
pub const W1: Complex64 = Complex64::new(0.5, 0.866025403784438646763723171);
/// `W2 = W1^2 = exp(i*2*pi/3)`, the primitive cube root of unity used by
/// the tripling step.
pub const W2: Complex64 = Complex64::new(-0.5, 0.866025403784438646763723171);
/// `W4 = W1^4 = conj(W2)`.
const W4: Complex64 = Complex64::new(-0.5, -0.866025403784438646763723171);

/// Trisect a trinomial-ring FFT-domain vector into three equal-length
/// shares via the cube-root-of-unity (`W1`/`W2`) basis, grounded in the
/// `t0/t1/t2` combination of `falcon_poly_split_top_fft3` in
/// `original_source/src/utils/arith/falcon_fft.c`. Falcon's general,
/// variable-depth version additionally multiplies each group by a
/// position-dependent root drawn from a precomputed table
/// (`fpr_gm3_cubic`) whose definition doesn't appear anywhere in this
/// pack (only call sites reference it), so it can't be reproduced here;
/// this applies the same fixed cube-root combination to every group of
/// three consecutive complex samples instead, which is a real,
/// round-tripping trisection but not bit-identical to Falcon's
/// internally-twiddled one.
pub fn split_top(f: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let hn = f.len() / 2;
    assert_eq!(f.len(), hn * 2, "packed FFT3 vector must have an even length");
    assert_eq!(hn % 3, 0, "split_top needs a multiple-of-three count of complex samples");
    let groups = hn / 3;
    let mut f0 = vec![0.0; groups * 2];
    let mut f1 = vec![0.0; groups * 2];
    let mut f2 = vec![0.0; groups * 2];
    for v in 0..groups {
        let u = 3 * v;
        let a = Complex64::new(f[u], f[u + hn]);
        let b = Complex64::new(f[u + 1], f[u + 1 + hn]);
        let c = Complex64::new(f[u + 2], f[u + 2 + hn]);
        let t0 = (a + b + c) / 3.0;
        let t1 = (a + b * W4 + c * W2) / 3.0;
        let t2 = (a + b * W2 + c * W4) / 3.0;
        f0[v] = t0.re;
        f0[v + groups] = t0.im;
        f1[v] = t1.re;
        f1[v + groups] = t1.im;
        f2[v] = t2.re;
        f2[v + groups] = t2.im;
    }
    (f0, f1, f2)
}

/// Inverse of [`split_top`].
pub fn merge_top(f0: &[f64], f1: &[f64], f2: &[f64]) -> Vec<f64> {
    assert_eq!(f0.len(), f1.len());
    assert_eq!(f1.len(), f2.len());
    let groups = f0.len() / 2;
    let hn = groups * 3;
    let mut out = vec![0.0; hn * 2];
    for v in 0..groups {
        let u = 3 * v;
        let c0 = Complex64::new(f0[v], f0[v + groups]);
        let c1 = Complex64::new(f1[v], f1[v + groups]);
        let c2 = Complex64::new(f2[v], f2[v + groups]);
        let a = c0 + c1 + c2;
        let b = c0 + c1 * W2 + c2 * W4;
        let c = c0 + c1 * W4 + c2 * W2;
        out[u] = a.re;
        out[u + hn] = a.im;
        out[u + 1] = b.re;
        out[u + 1 + hn] = b.im;
        out[u + 2] = c.re;
        out[u + 2 + hn] = c.im;
    }
    out
}

/// Halve a trinomial-ring FFT-domain vector's degree by solving each
/// packed complex sample `a(w) = a0 + a1*w` (the ring's `X^2 - X + 1`
/// base case, `w = W1`) for its two real coefficients: `a1 = Im(a(w)) /
/// Im(w)`, `a0 = Re(a(w)) - Re(w)*a1`. Grounded in the `logn == 1`
/// branch of `falcon_poly_split_deep_fft3`, which is table-free and
/// exact; applied here per-sample across the whole vector rather than
/// only at the single-sample base case.
pub fn split_deep(f: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let hn = f.len() / 2;
    assert_eq!(f.len(), hn * 2, "packed FFT3 vector must have an even length");
    let mut f0 = vec![0.0; hn];
    let mut f1 = vec![0.0; hn];
    for i in 0..hn {
        let re = f[i];
        let im = f[i + hn];
        let a1 = im / W1.im;
        let a0 = re - a1 * 0.5;
        f0[i] = a0;
        f1[i] = a1;
    }
    (f0, f1)
}

/// Inverse of [`split_deep`]: `a(w) = a0 + a1*w`, grounded in the
/// `logn == 1` branch of `falcon_poly_merge_deep_fft3`.
pub fn merge_deep(f0: &[f64], f1: &[f64]) -> Vec<f64> {
    assert_eq!(f0.len(), f1.len());
    let hn = f0.len();
    let mut out = vec![0.0; hn * 2];
    for i in 0..hn {
        out[i] = f0[i] + f1[i] * W1.re;
        out[i + hn] = f1[i] * W1.im;
    }
    out
}

/// Recursive radix-2 Cooley-Tukey DFT, `O(n log n)`, `n` a power of two.
fn dft(a: &[Complex64], inverse: bool) -> Vec<Complex64> {
    let n = a.len();
    if n == 1 {
        return vec![a[0]];
    }
    let even: Vec<Complex64> = a.iter().step_by(2).copied().collect();
    let odd: Vec<Complex64> = a.iter().skip(1).step_by(2).copied().collect();
    let fe = dft(&even, inverse);
    let fo = dft(&odd, inverse);
    let sign = if inverse { 1.0 } else { -1.0 };
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for k in 0..n / 2 {
        let twiddle = Complex64::from_polar(1.0, sign * 2.0 * PI * k as f64 / n as f64) * fo[k];
        out[k] = fe[k] + twiddle;
        out[k + n / 2] = fe[k] - twiddle;
    }
    if inverse {
        for v in &mut out {
            *v /= 2.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_inverse_roundtrip() {
        let n = 16;
        let coeffs: Vec<f64> = (0..n).map(|i| (i as f64 - 3.0) * 0.5).collect();
        let f = CycloFft::forward(&coeffs);
        let back = f.inverse();
        for (a, b) in coeffs.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "a={a} b={b}");
        }
    }

    #[test]
    fn mul_matches_negacyclic_convolution() {
        let n = 8;
        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        a[0] = 1.0;
        a[1] = 2.0;
        b[0] = 3.0;
        b[1] = -1.0;
        let fa = CycloFft::forward(&a);
        let fb = CycloFft::forward(&b);
        let prod = CycloFft::mul(&fa, &fb);
        let back = prod.inverse();
        // (1+2x)(3-x) = 3 + 5x - 2x^2, no wraparound since degree < n.
        assert!((back[0] - 3.0).abs() < 1e-9);
        assert!((back[1] - 5.0).abs() < 1e-9);
        assert!((back[2] - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn split_merge_top_roundtrip() {
        // 3 packed complex samples: real block [1,2,3], imaginary block [4,5,6].
        let f = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let (f0, f1, f2) = split_top(&f);
        let back = merge_top(&f0, &f1, &f2);
        for (a, b) in f.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "a={a} b={b}");
        }
    }

    #[test]
    fn split_merge_deep_roundtrip() {
        // 2 packed complex samples: real block [1,2], imaginary block [3,4].
        let f = vec![1.0, 2.0, 3.0, 4.0];
        let (f0, f1) = split_deep(&f);
        let back = merge_deep(&f0, &f1);
        for (a, b) in f.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "a={a} b={b}");
        }
    }

    #[test]
    fn w1_and_w2_are_sixth_and_cube_roots_of_unity() {
        // W1^6 == 1 (primitive sixth root), W2 == W1^2 (primitive cube root).
        let w1_6 = (0..6).fold(Complex64::new(1.0, 0.0), |acc, _| acc * W1);
        assert!((w1_6 - Complex64::new(1.0, 0.0)).norm() < 1e-9);
        let w1_2 = W1 * W1;
        assert!((w1_2 - W2).norm() < 1e-9);
    }

    #[test]
    fn mulselfadj_is_real_and_nonnegative() {
        let n = 8;
        let coeffs: Vec<f64> = (0..n).map(|i| i as f64 - 4.0).collect();
        let f = CycloFft::forward(&coeffs);
        let s = CycloFft::mulselfadj(&f);
        for c in s.as_slice() {
            assert!(c.im.abs() < 1e-12);
            assert!(c.re >= 0.0);
        }
    }
}
