//! Multi-precision floating point (§3, §4.3).
//!
//! A finite non-zero value is `sign * mantissa * 2^(exponent - precision)`
//! where `mantissa` is a `precision`-bit [`Mpz`] magnitude with its top bit
//! set (the §3 invariant `mantissa[top] & MSB == 1`). Zero is `exponent =
//! NEG_INF_EXP` with an empty mantissa; `NaN`/`Inf` are tracked by an
//! explicit [`Kind`] tag rather than encoded into the exponent range, which
//! keeps the edge-case table in §4.3 exhaustive and easy to check from
//! `is_nan`/`is_inf`/`is_neg` as that section requires.
//!
//! Built on [`crate::mpz::Mpz`] for the mantissa, so multiplication/
//! addition/division reduce to integer bignum operations at a chosen bit
//! precision — this is where the "table-build time" work of §4.3 (Gaussian
//! CDF construction in §4.10, table constants in §4.7) gets its exactness,
//! superseding the coarse f64 approximations in the original's `sc_math.c`
//! (see SPEC_FULL.md §4.1).

use crate::mpz::Mpz;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Finite,
    Zero,
    Inf,
    NaN,
}

/// Errors produced when narrowing an [`Mpf`] to a host integer type.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum MpfError {
    #[error("value is NaN")]
    NotANumber,
    #[error("value is infinite")]
    Infinite,
    #[error("value does not fit in the target integer type")]
    DoesNotFit,
}

/// A multi-precision floating-point value at a given bit precision.
#[derive(Debug, Clone)]
pub struct Mpf {
    precision: u32,
    kind: Kind,
    sign: bool,
    /// Binary exponent: meaningful only when `kind == Finite`.
    exp: i64,
    /// `precision`-bit normalized magnitude; meaningful only when `kind == Finite`.
    mantissa: Mpz,
}

impl Mpf {
    /// Default precision (bits) used by [`Mpf::new`]. Matches the source's
    /// "global precision... consulted at init time" (§3); here it is an
    /// explicit argument rather than a mutable global, which is the more
    /// idiomatic Rust shape for what was process-wide mutable state.
    pub const DEFAULT_PRECISION: u32 = 128;

    pub fn new(precision: u32) -> Self {
        Mpf { precision: precision.max(8), kind: Kind::Zero, sign: false, exp: 0, mantissa: Mpz::zero() }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn nan(precision: u32) -> Self {
        Mpf { precision, kind: Kind::NaN, sign: false, exp: 0, mantissa: Mpz::zero() }
    }

    pub fn inf(precision: u32, neg: bool) -> Self {
        Mpf { precision, kind: Kind::Inf, sign: neg, exp: 0, mantissa: Mpz::zero() }
    }

    pub fn is_zero(&self) -> bool {
        self.kind == Kind::Zero
    }
    pub fn is_nan(&self) -> bool {
        self.kind == Kind::NaN
    }
    pub fn is_inf(&self) -> bool {
        self.kind == Kind::Inf
    }
    pub fn is_neg(&self) -> bool {
        self.kind != Kind::NaN && self.sign && self.kind != Kind::Zero
    }
    pub fn sign(&self) -> i32 {
        match self.kind {
            Kind::NaN | Kind::Zero => 0,
            _ if self.sign => -1,
            _ => 1,
        }
    }

    pub fn set_ui(&mut self, v: u64) {
        *self = Self::from_u64(self.precision, v);
    }
    pub fn set_si(&mut self, v: i64) {
        let mut r = Self::from_u64(self.precision, v.unsigned_abs());
        r.sign = v < 0;
        *self = r;
    }
    pub fn set_d(&mut self, v: f64) {
        *self = Self::from_f64(self.precision, v);
    }

    pub fn from_u64(precision: u32, v: u64) -> Self {
        if v == 0 {
            return Self::new(precision);
        }
        let bits = 64 - v.leading_zeros();
        let mant = Mpz::from_ui(v);
        let mut m = Mpf { precision, kind: Kind::Finite, sign: false, exp: bits as i64, mantissa: mant };
        m.normalize();
        m
    }

    pub fn from_f64(precision: u32, v: f64) -> Self {
        if v.is_nan() {
            return Self::nan(precision);
        }
        if v.is_infinite() {
            return Self::inf(precision, v < 0.0);
        }
        if v == 0.0 {
            return Self::new(precision);
        }
        let sign = v.is_sign_negative();
        let mut x = v.abs();
        let mut exp = 0i64;
        while x >= 1.0 {
            x /= 2.0;
            exp += 1;
        }
        while x < 0.5 {
            x *= 2.0;
            exp -= 1;
        }
        // x in [0.5, 1.0); extract `precision` bits.
        let mut mantissa = Mpz::zero();
        for _ in 0..precision {
            mantissa = Mpz::mul_2exp(&mantissa, 1);
            x *= 2.0;
            if x >= 1.0 {
                mantissa = Mpz::add(&mantissa, &Mpz::from_ui(1));
                x -= 1.0;
            }
        }
        let mut m = Mpf { precision, kind: Kind::Finite, sign, exp, mantissa };
        m.normalize();
        m
    }

    /// Shift `mantissa` so it occupies exactly `precision` bits with the
    /// top bit set, adjusting `exp` to compensate. Collapses to `Zero` if
    /// the mantissa is empty.
    fn normalize(&mut self) {
        if self.kind != Kind::Finite {
            return;
        }
        if self.mantissa.is_zero() {
            self.kind = Kind::Zero;
            self.exp = 0;
            return;
        }
        let bits = mpz_bit_length(&self.mantissa);
        let target = self.precision as i64;
        if (bits as i64) > target {
            let shift = bits as i64 - target;
            self.mantissa = Mpz::divquo_2exp(&self.mantissa, shift as u32);
            self.exp += shift;
        } else if (bits as i64) < target {
            let shift = target - bits as i64;
            self.mantissa = Mpz::mul_2exp(&self.mantissa, shift as u32);
            self.exp -= shift;
        }
    }

    pub fn get_d(&self) -> f64 {
        match self.kind {
            Kind::NaN => f64::NAN,
            Kind::Inf => if self.sign { f64::NEG_INFINITY } else { f64::INFINITY },
            Kind::Zero => 0.0,
            Kind::Finite => {
                let m = self.mantissa.get_d() / 2f64.powi(self.precision as i32);
                let v = m * 2f64.powi(self.exp.clamp(-1022, 1023) as i32);
                if self.sign { -v } else { v }
            }
        }
    }

    pub fn get_ui(&self) -> u64 {
        self.get_d().max(0.0) as u64
    }
    pub fn get_si(&self) -> i64 {
        self.get_d() as i64
    }

    pub fn fits_ulimb(&self) -> bool {
        !self.is_nan() && !self.is_neg() && self.get_d() <= u64::MAX as f64
    }
    pub fn fits_slimb(&self) -> bool {
        !self.is_nan() && self.get_d().abs() <= i64::MAX as f64
    }

    /// Fallible narrowing to `u64`, used by callers that cannot tolerate
    /// the silent truncation [`Mpf::get_ui`] performs.
    pub fn try_get_ui(&self) -> Result<u64, MpfError> {
        if self.is_nan() {
            return Err(MpfError::NotANumber);
        }
        if self.is_inf() {
            return Err(MpfError::Infinite);
        }
        if !self.fits_ulimb() {
            return Err(MpfError::DoesNotFit);
        }
        Ok(self.get_ui())
    }

    /// Fallible narrowing to `i64`.
    pub fn try_get_si(&self) -> Result<i64, MpfError> {
        if self.is_nan() {
            return Err(MpfError::NotANumber);
        }
        if self.is_inf() {
            return Err(MpfError::Infinite);
        }
        if !self.fits_slimb() {
            return Err(MpfError::DoesNotFit);
        }
        Ok(self.get_si())
    }

    pub fn abs(&self) -> Mpf {
        let mut r = self.clone();
        r.sign = false;
        r
    }
    pub fn negate(&self) -> Mpf {
        let mut r = self.clone();
        if r.kind != Kind::Zero {
            r.sign = !r.sign;
        }
        r
    }

    pub fn cmp(&self, other: &Mpf) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        Some(self.get_d().partial_cmp(&other.get_d()).unwrap_or(Ordering::Equal).then_with(|| self.cmp_exact(other)))
    }

    /// Exact tie-break used only when the f64 preview compares equal but
    /// the values may differ beyond f64 precision; falls back to exact
    /// mantissa/exponent comparison for finite same-sign values.
    fn cmp_exact(&self, other: &Mpf) -> Ordering {
        match (self.kind, other.kind) {
            (Kind::Zero, Kind::Zero) => Ordering::Equal,
            (Kind::Finite, Kind::Finite) if self.sign == other.sign => {
                let o = self.exp.cmp(&other.exp).then_with(|| self.mantissa.cmpabs(&other.mantissa));
                if self.sign { o.reverse() } else { o }
            }
            _ => Ordering::Equal,
        }
    }

    pub fn cmp_ui(&self, other: u64) -> Option<Ordering> {
        self.cmp(&Mpf::from_u64(self.precision, other))
    }

    fn binop(a: &Mpf, b: &Mpf, f: impl FnOnce(&Mpf, &Mpf) -> Mpf) -> Mpf {
        if a.is_nan() || b.is_nan() {
            return Mpf::nan(a.precision.max(b.precision));
        }
        f(a, b)
    }

    pub fn add(a: &Mpf, b: &Mpf) -> Mpf {
        Self::binop(a, b, |a, b| {
            let p = a.precision.max(b.precision);
            match (a.kind, b.kind) {
                (Kind::Inf, Kind::Inf) => if a.sign == b.sign { Mpf::inf(p, a.sign) } else { Mpf::nan(p) },
                (Kind::Inf, _) => Mpf::inf(p, a.sign),
                (_, Kind::Inf) => Mpf::inf(p, b.sign),
                (Kind::Zero, Kind::Zero) => Mpf::new(p),
                (Kind::Zero, _) => { let mut r = b.clone(); r.precision = p; r }
                (_, Kind::Zero) => { let mut r = a.clone(); r.precision = p; r }
                (Kind::Finite, Kind::Finite) => add_finite(a, b, p),
                _ => Mpf::nan(p),
            }
        })
    }

    pub fn add_ui(a: &Mpf, v: u64) -> Mpf {
        Self::add(a, &Mpf::from_u64(a.precision, v))
    }
    pub fn add_si(a: &Mpf, v: i64) -> Mpf {
        Self::add(a, &{ let mut t = Mpf::from_u64(a.precision, v.unsigned_abs()); t.sign = v < 0; t })
    }

    pub fn sub(a: &Mpf, b: &Mpf) -> Mpf {
        Self::add(a, &b.negate())
    }
    pub fn sub_ui(a: &Mpf, v: u64) -> Mpf {
        Self::sub(a, &Mpf::from_u64(a.precision, v))
    }
    pub fn sub_si(a: &Mpf, v: i64) -> Mpf {
        Self::add_si(a, -v)
    }

    pub fn mul(a: &Mpf, b: &Mpf) -> Mpf {
        Self::binop(a, b, |a, b| {
            let p = a.precision.max(b.precision);
            match (a.kind, b.kind) {
                (Kind::Zero, Kind::Inf) | (Kind::Inf, Kind::Zero) => Mpf::nan(p),
                (Kind::Inf, _) | (_, Kind::Inf) => Mpf::inf(p, a.sign != b.sign),
                (Kind::Zero, _) | (_, Kind::Zero) => Mpf::new(p),
                (Kind::Finite, Kind::Finite) => {
                    let mant = Mpz::mul(&a.mantissa, &b.mantissa);
                    let mut r = Mpf { precision: p, kind: Kind::Finite, sign: a.sign != b.sign, exp: a.exp + b.exp, mantissa: mant };
                    r.normalize();
                    r
                }
                _ => Mpf::nan(p),
            }
        })
    }

    pub fn mul_ui(a: &Mpf, v: u64) -> Mpf {
        Self::mul(a, &Mpf::from_u64(a.precision, v))
    }
    pub fn mul_si(a: &Mpf, v: i64) -> Mpf {
        Self::mul(a, &{ let mut t = Mpf::from_u64(a.precision, v.unsigned_abs()); t.sign = v < 0; t })
    }

    /// `a / b` to `a.precision` bits, via bit-by-bit restoring division on
    /// the mantissas.
    pub fn div(a: &Mpf, b: &Mpf) -> Mpf {
        Self::binop(a, b, |a, b| {
            let p = a.precision.max(b.precision);
            match (a.kind, b.kind) {
                (Kind::Zero, Kind::Zero) => Mpf::nan(p),
                (Kind::Zero, _) => Mpf::new(p),
                (_, Kind::Zero) => Mpf::inf(p, a.sign),
                (Kind::Inf, Kind::Inf) => Mpf::nan(p),
                (Kind::Inf, _) => Mpf::inf(p, a.sign != b.sign),
                (_, Kind::Inf) => Mpf::new(p),
                (Kind::Finite, Kind::Finite) => {
                    let num = Mpz::mul_2exp(&a.mantissa, p + 8);
                    let (q, _) = Mpz::div(&num, &b.mantissa).expect("b.mantissa non-zero: Finite kind implies non-empty mantissa");
                    let mut r = Mpf { precision: p, kind: Kind::Finite, sign: a.sign != b.sign, exp: a.exp - b.exp - 8, mantissa: q };
                    r.normalize();
                    r
                }
                _ => Mpf::nan(p),
            }
        })
    }

    pub fn div_ui(a: &Mpf, v: u64) -> Mpf {
        Self::div(a, &Mpf::from_u64(a.precision, v))
    }
    pub fn div_si(a: &Mpf, v: i64) -> Mpf {
        Self::div(a, &{ let mut t = Mpf::from_u64(a.precision, v.unsigned_abs()); t.sign = v < 0; t })
    }

    pub fn div_2exp(a: &Mpf, n: u32) -> Mpf {
        let mut r = a.clone();
        if r.kind == Kind::Finite {
            r.exp -= n as i64;
        }
        r
    }

    /// Newton's method `x_{n+1} = (x_n + a/x_n)/2`, seeded from an f64
    /// estimate, refined to the configured precision.
    pub fn sqrt(a: &Mpf) -> Mpf {
        if a.is_nan() {
            return Mpf::nan(a.precision);
        }
        if a.is_neg() {
            return Mpf::nan(a.precision);
        }
        if a.is_zero() {
            return Mpf::new(a.precision);
        }
        if a.is_inf() {
            return Mpf::inf(a.precision, false);
        }
        let seed = a.get_d().sqrt();
        let mut x = Mpf::from_f64(a.precision, if seed.is_finite() && seed > 0.0 { seed } else { 1.0 });
        let iters = (a.precision as f64).log2().ceil() as u32 + 4;
        let two = Mpf::from_u64(a.precision, 2);
        for _ in 0..iters {
            let quot = Mpf::div(a, &x);
            x = Mpf::div(&Mpf::add(&x, &quot), &two);
        }
        x
    }

    pub fn sqrt_ui(precision: u32, v: u64) -> Mpf {
        Self::sqrt(&Mpf::from_u64(precision, v))
    }

    /// `a^e` for a non-negative integer exponent, `x^0 == 1` for every
    /// `x` (including `NaN`/`Inf`, per §4.3).
    pub fn pow_ui(a: &Mpf, e: u64) -> Mpf {
        if e == 0 {
            return Mpf::from_u64(a.precision, 1);
        }
        if a.is_nan() {
            return Mpf::nan(a.precision);
        }
        let mut base = a.clone();
        let mut result = Mpf::from_u64(a.precision, 1);
        let mut exp = e;
        while exp != 0 {
            if exp & 1 == 1 {
                result = Mpf::mul(&result, &base);
            }
            base = Mpf::mul(&base, &base);
            exp >>= 1;
        }
        result
    }

    /// `e^a`, via the Taylor series `sum x^n/n!`, summed until the term
    /// underflows the configured precision.
    pub fn exp(a: &Mpf) -> Mpf {
        if a.is_nan() {
            return Mpf::nan(a.precision);
        }
        if a.is_inf() {
            return if a.sign { Mpf::new(a.precision) } else { Mpf::inf(a.precision, false) };
        }
        if a.is_zero() {
            return Mpf::from_u64(a.precision, 1);
        }
        let p = a.precision;
        let mut term = Mpf::from_u64(p, 1);
        let mut sum = Mpf::from_u64(p, 1);
        let max_terms = (p as u64) * 4 + 64;
        for n in 1..max_terms {
            term = Mpf::mul(&term, a);
            term = Mpf::div_ui(&term, n);
            sum = Mpf::add(&sum, &term);
            if term.is_zero() || term.exp + (p as i64) < sum.exp.saturating_sub(p as i64) {
                break;
            }
        }
        sum
    }

    /// `ln(a)` for `a > 0`, via Newton's method on `f(y) = exp(y) - a`.
    pub fn log(a: &Mpf) -> Mpf {
        if a.is_nan() || a.is_neg() {
            return Mpf::nan(a.precision);
        }
        if a.is_zero() {
            return Mpf::inf(a.precision, true);
        }
        if a.is_inf() {
            return Mpf::inf(a.precision, false);
        }
        let seed = a.get_d().ln();
        let mut y = Mpf::from_f64(a.precision, if seed.is_finite() { seed } else { 0.0 });
        let iters = (a.precision as f64).log2().ceil() as u32 + 6;
        for _ in 0..iters {
            let e = Mpf::exp(&y);
            // y_{n+1} = y_n - 1 + a * exp(-y_n) = y_n + (a - e)/e
            let delta = Mpf::div(&Mpf::sub(a, &e), &e);
            y = Mpf::add(&y, &delta);
        }
        y
    }

    /// Round toward negative infinity to an integer value (still an `Mpf`).
    pub fn floor(a: &Mpf) -> Mpf {
        if a.kind != Kind::Finite {
            return a.clone();
        }
        if a.exp <= 0 {
            // |a| < 1: floor is 0 unless a is a negative non-zero value.
            return if a.sign { Mpf::from_si(a.precision, -1) } else { Mpf::new(a.precision) };
        }
        // mantissa holds `precision` bits with weight starting at `exp`;
        // bits below weight 0 are the fractional part.
        let frac_bits = (a.precision as i64) - a.exp;
        let (mant, had_frac) = if frac_bits > 0 {
            let truncated = Mpz::divquo_2exp(&a.mantissa, frac_bits as u32);
            let had_frac = Mpz::mul_2exp(&truncated, frac_bits as u32) != a.mantissa;
            (Mpz::mul_2exp(&truncated, frac_bits as u32), had_frac)
        } else {
            (a.mantissa.clone(), false)
        };
        let mut r = Mpf { precision: a.precision, kind: Kind::Finite, sign: a.sign, exp: a.exp, mantissa: mant };
        r.normalize();
        if a.sign && had_frac {
            r = Mpf::sub(&r, &Mpf::from_u64(a.precision, 1));
        }
        r
    }

    pub fn from_si(precision: u32, v: i64) -> Self {
        let mut r = Self::from_u64(precision, v.unsigned_abs());
        r.sign = v < 0;
        r
    }
}

fn mpz_bit_length(m: &Mpz) -> u32 {
    let limbs = m.get_limbs();
    if limbs.is_empty() {
        return 0;
    }
    let top = limbs.len() - 1;
    (top as u32) * 64 + (64 - limbs[top].leading_zeros())
}

fn add_finite(a: &Mpf, b: &Mpf, p: u32) -> Mpf {
    // Align to the larger exponent by shifting the smaller mantissa right.
    let (hi, lo) = if a.exp >= b.exp { (a, b) } else { (b, a) };
    let shift = (hi.exp - lo.exp).max(0) as u32;
    let lo_mant = if shift > a.precision.max(b.precision) + 8 {
        Mpz::zero()
    } else {
        Mpz::divquo_2exp(&lo.mantissa, shift)
    };
    let hi_mant = hi.mantissa.clone();
    let (mant, sign) = if hi.sign == lo.sign {
        (Mpz::add(&hi_mant, &lo_mant), hi.sign)
    } else {
        match hi_mant.cmpabs(&lo_mant) {
            Ordering::Less => (Mpz::sub(&lo_mant, &hi_mant), lo.sign),
            _ => (Mpz::sub(&hi_mant, &lo_mant), hi.sign),
        }
    };
    let mut r = Mpf { precision: p, kind: Kind::Finite, sign, exp: hi.exp, mantissa: mant };
    r.normalize();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Mpf, expected: f64, eps: f64) {
        assert!((a.get_d() - expected).abs() < eps, "got {} expected {}", a.get_d(), expected);
    }

    #[test]
    fn edge_cases_observable_via_tags() {
        let p = 64;
        let nan = Mpf::nan(p);
        let inf = Mpf::inf(p, false);
        let ninf = Mpf::inf(p, true);
        let zero = Mpf::new(p);
        let one = Mpf::from_u64(p, 1);

        assert!(Mpf::add(&one, &nan).is_nan());
        assert!(Mpf::add(&inf, &ninf).is_nan());
        assert!(Mpf::mul(&inf, &zero).is_nan());
        assert!(Mpf::div(&one, &zero).is_inf() && !Mpf::div(&one, &zero).is_neg());
        assert!(Mpf::div(&Mpf::from_si(p, -1), &zero).is_neg());
        assert!(Mpf::div(&zero, &zero).is_nan());
        assert!(Mpf::sqrt(&Mpf::from_si(p, -1)).is_nan());
        assert!(Mpf::pow_ui(&nan, 0).get_d() == 1.0);
        assert!(Mpf::pow_ui(&inf, 0).get_d() == 1.0);
        assert!(Mpf::pow_ui(&inf, 3).is_inf());
        assert!(Mpf::pow_ui(&ninf, 2).get_d() > 0.0 && Mpf::pow_ui(&ninf, 2).is_inf());
        assert!(Mpf::pow_ui(&ninf, 3).is_neg());
    }

    #[test]
    fn add_sub_roundtrip() {
        let p = 64;
        let a = Mpf::from_f64(p, 3.5);
        let b = Mpf::from_f64(p, -1.25);
        let sum = Mpf::add(&a, &b);
        close(&sum, 2.25, 1e-9);
        let back = Mpf::sub(&sum, &b);
        close(&back, 3.5, 1e-9);
    }

    #[test]
    fn mul_div_roundtrip() {
        let p = 64;
        let a = Mpf::from_f64(p, 7.0);
        let b = Mpf::from_f64(p, 3.0);
        let prod = Mpf::mul(&a, &b);
        close(&prod, 21.0, 1e-6);
        let back = Mpf::div(&prod, &b);
        close(&back, 7.0, 1e-6);
    }

    #[test]
    fn sqrt_matches_float() {
        let p = 80;
        let a = Mpf::from_u64(p, 2);
        let r = Mpf::sqrt(&a);
        close(&r, std::f64::consts::SQRT_2, 1e-12);
    }

    #[test]
    fn exp_log_roundtrip() {
        let p = 80;
        let a = Mpf::from_f64(p, 1.5);
        let e = Mpf::exp(&a);
        close(&e, 1.5f64.exp(), 1e-9);
        let back = Mpf::log(&e);
        close(&back, 1.5, 1e-6);
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        let p = 64;
        close(&Mpf::floor(&Mpf::from_f64(p, 3.7)), 3.0, 1e-9);
        close(&Mpf::floor(&Mpf::from_f64(p, -3.7)), -4.0, 1e-9);
        close(&Mpf::floor(&Mpf::from_f64(p, 3.0)), 3.0, 1e-9);
    }
}
