//! Polynomial kernels over Z and Z/2Z (§4.4).
//!
//! [`Poly`] holds MPZ coefficients and is the general-purpose kernel used
//! by resultant/xgcd-style constructions; [`ring32::Poly32`] and
//! [`z2::Poly2`] are the small, fixed-width rings used by the sampling and
//! lattice layers built on top of this crate. No MPZ-coefficient
//! polynomial implementation file survived into the retrieval pack —
//! only its unit test, `original_source/src/unit/unit_sc_poly_mpz.c` —
//! so this module is grounded in that test's exercised surface plus
//! `original_source/src/utils/arith/sc_mpz.c` for the underlying
//! arbitrary-precision arithmetic ([`crate::mpz::Mpz`]).

pub mod ring32;
pub mod z2;

use crate::mpz::Mpz;
use std::cmp::Ordering;

/// Errors produced by the MPZ-coefficient polynomial kernel.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PolyError {
    #[error("division by the zero polynomial")]
    DivisionByZero,
    #[error("leading coefficient is not invertible for exact division")]
    NotExactlyDivisible,
}

/// A polynomial with `Mpz` coefficients, `coeffs[i]` being the coefficient
/// of `x^i`. Always trimmed so the last entry (if any) is non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Poly {
    coeffs: Vec<Mpz>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly { coeffs: Vec::new() }
    }

    pub fn from_coeffs(mut coeffs: Vec<Mpz>) -> Self {
        while coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
            coeffs.pop();
        }
        Poly { coeffs }
    }

    pub fn coeffs(&self) -> &[Mpz] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// `-1` for the zero polynomial, else the highest non-zero index.
    pub fn degree(&self) -> isize {
        self.coeffs.len() as isize - 1
    }

    pub fn leading(&self) -> Mpz {
        self.coeffs.last().cloned().unwrap_or_else(Mpz::zero)
    }

    pub fn copy(&self) -> Poly {
        self.clone()
    }

    pub fn reset(&mut self) {
        self.coeffs.clear();
    }

    pub fn add(a: &Poly, b: &Poly) -> Poly {
        let n = a.coeffs.len().max(b.coeffs.len());
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let ai = a.coeffs.get(i).cloned().unwrap_or_else(Mpz::zero);
            let bi = b.coeffs.get(i).cloned().unwrap_or_else(Mpz::zero);
            out.push(Mpz::add(&ai, &bi));
        }
        Poly::from_coeffs(out)
    }

    pub fn sub(a: &Poly, b: &Poly) -> Poly {
        let n = a.coeffs.len().max(b.coeffs.len());
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let ai = a.coeffs.get(i).cloned().unwrap_or_else(Mpz::zero);
            let bi = b.coeffs.get(i).cloned().unwrap_or_else(Mpz::zero);
            out.push(Mpz::sub(&ai, &bi));
        }
        Poly::from_coeffs(out)
    }

    /// O(n^2) schoolbook convolution.
    pub fn mul_gradeschool(a: &Poly, b: &Poly) -> Poly {
        if a.is_zero() || b.is_zero() {
            return Poly::zero();
        }
        let mut out = vec![Mpz::zero(); a.coeffs.len() + b.coeffs.len() - 1];
        for (i, ai) in a.coeffs.iter().enumerate() {
            if ai.is_zero() {
                continue;
            }
            for (j, bj) in b.coeffs.iter().enumerate() {
                out[i + j] = Mpz::add(&out[i + j], &Mpz::mul(ai, bj));
            }
        }
        Poly::from_coeffs(out)
    }

    pub fn mul(a: &Poly, b: &Poly) -> Poly {
        Self::mul_gradeschool(a, b)
    }

    /// Karatsuba recursion, falling back to schoolbook below a small
    /// threshold.
    pub fn mul_karatsuba(a: &Poly, b: &Poly) -> Poly {
        const THRESHOLD: usize = 24;
        if a.is_zero() || b.is_zero() {
            return Poly::zero();
        }
        let n = a.coeffs.len().max(b.coeffs.len());
        if n <= THRESHOLD {
            return Self::mul_gradeschool(a, b);
        }
        let mid = n / 2;
        let (a_lo, a_hi) = split_at(&a.coeffs, mid);
        let (b_lo, b_hi) = split_at(&b.coeffs, mid);
        let a_lo = Poly::from_coeffs(a_lo);
        let a_hi = Poly::from_coeffs(a_hi);
        let b_lo = Poly::from_coeffs(b_lo);
        let b_hi = Poly::from_coeffs(b_hi);

        let z0 = Self::mul_karatsuba(&a_lo, &b_lo);
        let z2 = Self::mul_karatsuba(&a_hi, &b_hi);
        let a_sum = Self::add(&a_lo, &a_hi);
        let b_sum = Self::add(&b_lo, &b_hi);
        let z1 = Self::sub(&Self::sub(&Self::mul_karatsuba(&a_sum, &b_sum), &z0), &z2);

        let mut out = vec![Mpz::zero(); z2.coeffs.len() + 2 * mid];
        for (i, c) in z0.coeffs.iter().enumerate() {
            out[i] = Mpz::add(&out[i], c);
        }
        for (i, c) in z1.coeffs.iter().enumerate() {
            out[i + mid] = Mpz::add(&out[i + mid], c);
        }
        for (i, c) in z2.coeffs.iter().enumerate() {
            out[i + 2 * mid] = Mpz::add(&out[i + 2 * mid], c);
        }
        Poly::from_coeffs(out)
    }

    /// Kronecker substitution: evaluate both operands at `x = 2^k` for a
    /// `k` wide enough that no product coefficient can overflow into its
    /// neighbour, multiply as one big integer, then slice the result back
    /// into coefficients.
    pub fn mul_kronecker(a: &Poly, b: &Poly) -> Poly {
        if a.is_zero() || b.is_zero() {
            return Poly::zero();
        }
        let max_bits = a.coeffs.iter().chain(b.coeffs.iter()).map(coeff_bits).max().unwrap_or(1);
        let min_len = a.coeffs.len().min(b.coeffs.len()).max(1) as u32;
        // Each product coefficient is a sum of at most `min_len` terms,
        // each at most `2*max_bits` wide, plus a sign bit headroom.
        let k = 2 * max_bits + 32 - (min_len.leading_zeros()) + 2;
        let ea = Self::ks_bit_pack(a, k);
        let eb = Self::ks_bit_pack(b, k);
        let prod = Mpz::mul(&ea, &eb);
        let out_len = a.coeffs.len() + b.coeffs.len() - 1;
        Self::ks_bit_unpack(&prod, k, out_len, true)
    }

    /// Pack coefficients by Horner evaluation at `x = 2^k`: `packed =
    /// p(2^k)`, a single (possibly negative) big integer.
    pub fn ks_bit_pack(p: &Poly, k: u32) -> Mpz {
        let mut acc = Mpz::zero();
        for c in p.coeffs.iter().rev() {
            acc = Mpz::add(&Mpz::mul_2exp(&acc, k), c);
        }
        acc
    }

    /// Inverse of [`Poly::ks_bit_pack`]: recover `len` signed base-`2^k`
    /// digits (each centered in `(-2^(k-1), 2^(k-1)]`) from `packed`. Exact
    /// whenever every true coefficient has magnitude below `2^(k-1)`.
    pub fn ks_bit_unpack(packed: &Mpz, k: u32, len: usize, _from_product: bool) -> Poly {
        let base = Mpz::mul_2exp(&Mpz::from_ui(1), k);
        let half = Mpz::divquo_2exp(&base, 1);
        let mut n = packed.clone();
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let (mut q, mut r) = Mpz::div(&n, &base).expect("base = 2^k is non-zero");
            if r.cmpabs(&half) != Ordering::Less {
                r = Mpz::sub(&r, &base);
                q = Mpz::add(&q, &Mpz::from_ui(1));
            }
            out.push(r);
            n = q;
        }
        Poly::from_coeffs(out)
    }

    /// Exact division, requiring the divisor's leading coefficient divide
    /// every intermediate leading coefficient exactly (true whenever `b`
    /// is monic, the common case for reduction polynomials).
    pub fn div(a: &Poly, b: &Poly) -> Result<(Poly, Poly), PolyError> {
        if b.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        let mut rem = a.clone();
        let mut quot = vec![Mpz::zero(); (a.degree() - b.degree()).max(-1) as usize + 1];
        let lc_b = b.leading();
        while rem.degree() >= b.degree() && !rem.is_zero() {
            let shift = (rem.degree() - b.degree()) as usize;
            let lc_r = rem.leading();
            let (q_coeff, r) = Mpz::div(&lc_r, &lc_b).map_err(|_| PolyError::NotExactlyDivisible)?;
            if !r.is_zero() {
                return Err(PolyError::NotExactlyDivisible);
            }
            quot[shift] = q_coeff.clone();
            let mut term_coeffs = vec![Mpz::zero(); shift];
            term_coeffs.extend(b.coeffs.iter().cloned());
            let term = Poly::from_coeffs(term_coeffs);
            let scaled = Self::mul(&Poly::from_coeffs(vec![q_coeff]), &term);
            rem = Self::sub(&rem, &scaled);
        }
        Ok((Poly::from_coeffs(quot), rem))
    }

    /// Pseudo-division: find `scale`, `q`, `r` with `scale*a = q*b + r`,
    /// `deg(r) < deg(b)`, where `scale = lc(b)^(deg(a)-deg(b)+1)`. Always
    /// succeeds for `b` non-zero.
    pub fn pseudo_div(a: &Poly, b: &Poly) -> (Mpz, Poly, Poly) {
        if b.is_zero() || a.degree() < b.degree() {
            return (Mpz::from_ui(1), Poly::zero(), a.clone());
        }
        let d = (a.degree() - b.degree() + 1) as u64;
        let lc_b = b.leading();
        let scale = Mpz::pow_ui(&lc_b, d);
        let scaled_a = Self::mul(&Poly::from_coeffs(vec![scale.clone()]), a);
        let mut rem = scaled_a;
        let mut quot = vec![Mpz::zero(); (rem.degree() - b.degree()).max(-1) as usize + 1];
        while rem.degree() >= b.degree() && !rem.is_zero() {
            let shift = (rem.degree() - b.degree()) as usize;
            let lc_r = rem.leading();
            let (q_coeff, _) = Mpz::div(&lc_r, &lc_b).expect("lc_b non-zero checked above");
            if shift >= quot.len() {
                quot.resize(shift + 1, Mpz::zero());
            }
            quot[shift] = Mpz::add(&quot[shift], &q_coeff);
            let mut term_coeffs = vec![Mpz::zero(); shift];
            term_coeffs.extend(b.coeffs.iter().cloned());
            let term = Poly::from_coeffs(term_coeffs);
            let scaled_term = Self::mul(&Poly::from_coeffs(vec![q_coeff]), &term);
            rem = Self::sub(&rem, &scaled_term);
        }
        (scale, Poly::from_coeffs(quot), rem)
    }

    pub fn pseudo_remainder(a: &Poly, b: &Poly) -> Poly {
        Self::pseudo_div(a, b).2
    }

    /// Fraction-free extended Euclidean algorithm via pseudo-division.
    /// Returns `(u, v, g)` with `u*a + v*b = g` up to an overall scalar
    /// factor accumulated from the pseudo-division scalings.
    pub fn xgcd(a: &Poly, b: &Poly) -> (Poly, Poly, Poly) {
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_s, mut s) = (Poly::from_coeffs(vec![Mpz::from_ui(1)]), Poly::zero());
        let (mut old_t, mut t) = (Poly::zero(), Poly::from_coeffs(vec![Mpz::from_ui(1)]));

        while !r.is_zero() {
            let (scale, q, rem) = Self::pseudo_div(&old_r, &r);
            let scale_poly = Poly::from_coeffs(vec![scale]);
            let new_r = rem;
            let new_s = Self::sub(&Self::mul(&scale_poly, &old_s), &Self::mul(&q, &s));
            let new_t = Self::sub(&Self::mul(&scale_poly, &old_t), &Self::mul(&q, &t));
            old_r = r;
            r = new_r;
            old_s = s;
            s = new_s;
            old_t = t;
            t = new_t;
        }
        (old_s, old_t, old_r)
    }

    /// Resultant of `a` and `b` via Bareiss fraction-free elimination on
    /// the Sylvester matrix.
    pub fn resultant(a: &Poly, b: &Poly) -> Mpz {
        if a.is_zero() || b.is_zero() {
            return Mpz::zero();
        }
        let m = a.degree() as usize;
        let n = b.degree() as usize;
        let size = m + n;
        if size == 0 {
            return Mpz::from_ui(1);
        }
        let mut mat = vec![vec![Mpz::zero(); size]; size];
        for row in 0..n {
            for (i, c) in a.coeffs.iter().rev().enumerate() {
                mat[row][row + i] = c.clone();
            }
        }
        for row in 0..m {
            for (i, c) in b.coeffs.iter().rev().enumerate() {
                mat[n + row][row + i] = c.clone();
            }
        }
        bareiss_determinant(mat)
    }

    /// GCD of all coefficients (0 for the zero polynomial).
    pub fn content(p: &Poly) -> Mpz {
        let mut g = Mpz::zero();
        for c in &p.coeffs {
            g = Mpz::gcd(&g, c);
        }
        g
    }

    /// Divide through by the content, returning `(primitive_part,
    /// content)`. The zero polynomial is its own primitive part with
    /// content zero.
    pub fn content_scale(p: &Poly) -> (Poly, Mpz) {
        let c = Self::content(p);
        if c.is_zero() || c.is_one() {
            return (p.clone(), if c.is_zero() { Mpz::from_ui(1) } else { c });
        }
        let coeffs = p.coeffs.iter().map(|x| Mpz::div(x, &c).expect("content divides every coefficient by construction").0).collect();
        (Poly::from_coeffs(coeffs), c)
    }
}

fn coeff_bits(c: &Mpz) -> u32 {
    let bytes = c.get_bytes_be();
    let lead = bytes.first().copied().unwrap_or(0);
    (bytes.len() as u32 - 1) * 8 + (8 - lead.leading_zeros().min(8))
}

fn split_at(v: &[Mpz], mid: usize) -> (Vec<Mpz>, Vec<Mpz>) {
    if v.len() <= mid {
        (v.to_vec(), Vec::new())
    } else {
        (v[..mid].to_vec(), v[mid..].to_vec())
    }
}

fn bareiss_determinant(mut mat: Vec<Vec<Mpz>>) -> Mpz {
    let n = mat.len();
    let mut prev_pivot = Mpz::from_ui(1);
    let mut sign = 1i32;
    for k in 0..n.saturating_sub(1) {
        if mat[k][k].is_zero() {
            match (k + 1..n).find(|&r| !mat[r][k].is_zero()) {
                Some(swap_row) => {
                    mat.swap(k, swap_row);
                    sign = -sign;
                }
                None => return Mpz::zero(),
            }
        }
        for i in (k + 1)..n {
            for j in (k + 1)..n {
                let num = Mpz::sub(&Mpz::mul(&mat[i][j], &mat[k][k]), &Mpz::mul(&mat[i][k], &mat[k][j]));
                let (q, _) = Mpz::div(&num, &prev_pivot).expect("Bareiss invariant: prev_pivot divides exactly");
                mat[i][j] = q;
            }
        }
        prev_pivot = mat[k][k].clone();
    }
    let mut det = mat[n - 1][n - 1].clone();
    if sign < 0 {
        det = Mpz::neg(&det);
    }
    det
}

impl PartialOrd for Poly {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.degree().cmp(&other.degree()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(coeffs: &[i64]) -> Poly {
        Poly::from_coeffs(coeffs.iter().map(|&c| Mpz::from_si(c)).collect())
    }

    #[test]
    fn add_sub_roundtrip() {
        let a = p(&[1, 2, 3]);
        let b = p(&[5, -1, 0, 4]);
        let sum = Poly::add(&a, &b);
        let back = Poly::sub(&sum, &b);
        assert_eq!(back, a);
    }

    #[test]
    fn schoolbook_matches_karatsuba() {
        let a = p(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30]);
        let b = p(&[9, -3, 2, 7, 0, 1, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4]);
        let g = Poly::mul_gradeschool(&a, &b);
        let k = Poly::mul_karatsuba(&a, &b);
        assert_eq!(g, k);
    }

    #[test]
    fn kronecker_matches_schoolbook() {
        let a = p(&[3, -2, 7]);
        let b = p(&[-1, 5, 0, 2]);
        let g = Poly::mul_gradeschool(&a, &b);
        let k = Poly::mul_kronecker(&a, &b);
        assert_eq!(g, k);
    }

    #[test]
    fn div_exact_monic_divisor() {
        // (x-1)(x+2) = x^2+x-2, divide by (x-1) -> (x+2), remainder 0
        let divisor = p(&[-1, 1]);
        let product = p(&[-2, 1, 1]);
        let (q, r) = Poly::div(&product, &divisor).unwrap();
        assert_eq!(q, p(&[2, 1]));
        assert!(r.is_zero());
    }

    #[test]
    fn content_scale_extracts_gcd() {
        let a = p(&[6, -9, 12]);
        let (prim, c) = Poly::content_scale(&a);
        assert_eq!(c.get_ui(), 3);
        assert_eq!(prim, p(&[2, -3, 4]));
    }

    #[test]
    fn resultant_of_coprime_lines_is_nonzero() {
        let a = p(&[1, 1]); // x+1
        let b = p(&[-1, 1]); // x-1
        let r = Poly::resultant(&a, &b);
        assert_eq!(r.get_si(), -2);
    }

    #[test]
    fn xgcd_bezout_identity_holds() {
        let a = p(&[-2, 0, 1]); // x^2 - 2
        let b = p(&[-1, 1]); // x - 1
        let (u, v, g) = Poly::xgcd(&a, &b);
        let lhs = Poly::add(&Poly::mul(&u, &a), &Poly::mul(&v, &b));
        assert_eq!(lhs, g);
    }
}
