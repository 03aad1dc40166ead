//! Small-ring polynomials with `i32` coefficients (§4.4, `Poly32`).
//!
//! Used where coefficients are known to stay small (NTRU-style trinary
//! polynomials, rounding noise) and a full `Mpz` coefficient would be
//! wasteful. Arithmetic is plain integer arithmetic on the coefficients,
//! not reduction modulo a ring ideal — callers needing that compose this
//! with their own reduction step.

use rand::Rng;

/// Errors produced by [`Poly32`] operations.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum Poly32Error {
    /// `uniform_rand` was asked to place more non-zero coefficients than
    /// the polynomial has slots; resolves the spec's open question in
    /// favor of a hard error over an unbounded rejection loop.
    #[error("requested {requested} non-zero coefficients but the polynomial only has {capacity} slots")]
    TooManyNonZero { requested: usize, capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly32 {
    coeffs: Vec<i32>,
}

impl Poly32 {
    pub fn zero(n: usize) -> Self {
        Poly32 { coeffs: vec![0; n] }
    }

    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        Poly32 { coeffs }
    }

    pub fn coeffs(&self) -> &[i32] {
        &self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn add(a: &Poly32, b: &Poly32) -> Poly32 {
        let n = a.coeffs.len().max(b.coeffs.len());
        let mut out = vec![0i32; n];
        for i in 0..n {
            out[i] = a.coeffs.get(i).copied().unwrap_or(0).wrapping_add(b.coeffs.get(i).copied().unwrap_or(0));
        }
        Poly32 { coeffs: out }
    }

    pub fn sub(a: &Poly32, b: &Poly32) -> Poly32 {
        let n = a.coeffs.len().max(b.coeffs.len());
        let mut out = vec![0i32; n];
        for i in 0..n {
            out[i] = a.coeffs.get(i).copied().unwrap_or(0).wrapping_sub(b.coeffs.get(i).copied().unwrap_or(0));
        }
        Poly32 { coeffs: out }
    }

    pub fn add_scalar(a: &Poly32, k: i32) -> Poly32 {
        let mut out = a.clone();
        if let Some(c0) = out.coeffs.first_mut() {
            *c0 = c0.wrapping_add(k);
        }
        out
    }

    pub fn sub_scalar(a: &Poly32, k: i32) -> Poly32 {
        Self::add_scalar(a, -k)
    }

    pub fn mul_scalar(a: &Poly32, k: i32) -> Poly32 {
        Poly32 { coeffs: a.coeffs.iter().map(|&c| c.wrapping_mul(k)).collect() }
    }

    /// Full (non-modular) convolution, using `i64` accumulation to avoid
    /// overflow for any product that fits back into `i32`.
    pub fn mul(a: &Poly32, b: &Poly32) -> Poly32 {
        if a.coeffs.is_empty() || b.coeffs.is_empty() {
            return Poly32 { coeffs: Vec::new() };
        }
        let mut acc = vec![0i64; a.coeffs.len() + b.coeffs.len() - 1];
        for (i, &ai) in a.coeffs.iter().enumerate() {
            if ai == 0 {
                continue;
            }
            for (j, &bj) in b.coeffs.iter().enumerate() {
                acc[i + j] += ai as i64 * bj as i64;
            }
        }
        Poly32 { coeffs: acc.into_iter().map(|v| v as i32).collect() }
    }

    /// Place `num_plus` coefficients at `+1`, `num_minus` at `-1`, and the
    /// rest at `0`, at positions chosen by a Fisher-Yates shuffle of
    /// `0..n`. Fails instead of looping if the two counts cannot fit.
    pub fn uniform_rand(n: usize, num_plus: usize, num_minus: usize, rng: &mut dyn rand::RngCore) -> Result<Poly32, Poly32Error> {
        let requested = num_plus + num_minus;
        if requested > n {
            return Err(Poly32Error::TooManyNonZero { requested, capacity: n });
        }
        let mut idx: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = rng.gen_range(0..=i);
            idx.swap(i, j);
        }
        let mut coeffs = vec![0i32; n];
        for &i in &idx[..num_plus] {
            coeffs[i] = 1;
        }
        for &i in &idx[num_plus..num_plus + num_minus] {
            coeffs[i] = -1;
        }
        Ok(Poly32 { coeffs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn add_sub_roundtrip() {
        let a = Poly32::from_coeffs(vec![1, 2, 3]);
        let b = Poly32::from_coeffs(vec![5, -1, 7]);
        let sum = Poly32::add(&a, &b);
        let back = Poly32::sub(&sum, &b);
        assert_eq!(back, a);
    }

    #[test]
    fn mul_matches_hand_computation() {
        let a = Poly32::from_coeffs(vec![1, 1]); // 1 + x
        let b = Poly32::from_coeffs(vec![1, -1]); // 1 - x
        let p = Poly32::mul(&a, &b); // 1 - x^2
        assert_eq!(p.coeffs(), &[1, 0, -1]);
    }

    #[test]
    fn uniform_rand_rejects_oversubscribed_request() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert_eq!(Poly32::uniform_rand(4, 3, 3, &mut rng), Err(Poly32Error::TooManyNonZero { requested: 6, capacity: 4 }));
    }

    #[test]
    fn uniform_rand_places_exact_counts() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let p = Poly32::uniform_rand(64, 10, 12, &mut rng).unwrap();
        let plus = p.coeffs().iter().filter(|&&c| c == 1).count();
        let minus = p.coeffs().iter().filter(|&&c| c == -1).count();
        assert_eq!(plus, 10);
        assert_eq!(minus, 12);
    }
}
