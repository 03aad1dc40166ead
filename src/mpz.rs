//! Multi-precision integer arithmetic (§3, §4.2).
//!
//! Signed-magnitude representation: a little-endian `Vec<u64>` of limbs
//! plus a sign flag. The invariant from §3 — "the top limb is non-zero
//! unless used = 0" — is maintained by [`Mpz::trim`] after every mutating
//! operation; zero is always the unique empty-limb, non-negative value.
//!
//! Per the non-goal in spec.md §1 ("no fallback to host-provided bignum
//! libraries in the spec — an implementation may substitute one, but the
//! API and semantics must match"), this is a from-scratch limb
//! implementation rather than a wrapper around an external bignum crate,
//! grounded directly in `original_source/src/utils/arith/sc_mpz.c` and
//! `limb_base.c`'s little-endian limb-array convention.

use std::cmp::Ordering;
use std::fmt;

/// A single machine word of limb storage.
pub type Limb = u64;

/// Errors produced by MPZ arithmetic.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum MpzError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modular inverse does not exist (gcd != 1)")]
    NotInvertible,
    #[error("modulus must be non-zero")]
    ZeroModulus,
}

/// A signed, arbitrary-precision integer.
#[derive(Clone, Debug, Default)]
pub struct Mpz {
    /// Magnitude, little-endian, no leading (most-significant) zero limb.
    limbs: Vec<Limb>,
    /// Sign of a non-zero value. Always `false` when `limbs` is empty.
    neg: bool,
}

impl Mpz {
    /// The integer zero.
    pub fn zero() -> Self {
        Mpz { limbs: Vec::new(), neg: false }
    }

    /// Initialise to zero (mirrors the source's `init` lifecycle call).
    pub fn init() -> Self {
        Self::zero()
    }

    /// Drop the value back to zero, freeing its limb storage.
    pub fn clear(&mut self) {
        self.limbs.clear();
        self.limbs.shrink_to_fit();
        self.neg = false;
    }

    fn trim(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        if self.limbs.is_empty() {
            self.neg = false;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        !self.neg && self.limbs.len() == 1 && self.limbs[0] == 1
    }

    pub fn is_neg(&self) -> bool {
        self.neg
    }

    /// `-1`, `0`, or `1`.
    pub fn sign(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.neg {
            -1
        } else {
            1
        }
    }

    pub fn set_ui(&mut self, v: u64) {
        self.neg = false;
        self.limbs = if v == 0 { Vec::new() } else { vec![v] };
    }

    pub fn set_si(&mut self, v: i64) {
        self.neg = v < 0;
        let mag = v.unsigned_abs();
        self.limbs = if mag == 0 { Vec::new() } else { vec![mag] };
    }

    /// Load from a big-endian byte string, treated as non-negative.
    pub fn set_bytes_be(&mut self, bytes: &[u8]) {
        let mut limbs = Vec::new();
        let mut chunks = bytes.rchunks(8);
        for c in chunks.by_ref() {
            let mut buf = [0u8; 8];
            buf[8 - c.len()..].copy_from_slice(c);
            limbs.push(u64::from_be_bytes(buf));
        }
        self.neg = false;
        self.limbs = limbs;
        self.trim();
    }

    pub fn set_limbs(&mut self, limbs: &[Limb], neg: bool) {
        self.limbs = limbs.to_vec();
        self.neg = neg;
        self.trim();
    }

    pub fn from_ui(v: u64) -> Self {
        let mut z = Self::zero();
        z.set_ui(v);
        z
    }

    pub fn from_si(v: i64) -> Self {
        let mut z = Self::zero();
        z.set_si(v);
        z
    }

    /// Fetch the magnitude as `u64`, truncating silently like the source's
    /// `get_ui`.
    pub fn get_ui(&self) -> u64 {
        self.limbs.first().copied().unwrap_or(0)
    }

    pub fn get_si(&self) -> i64 {
        let u = self.get_ui() as i64;
        if self.neg {
            -u
        } else {
            u
        }
    }

    pub fn get_d(&self) -> f64 {
        let mut acc = 0.0f64;
        for &l in self.limbs.iter().rev() {
            acc = acc * (u64::MAX as f64 + 1.0) + l as f64;
        }
        if self.neg {
            -acc
        } else {
            acc
        }
    }

    pub fn get_limbs(&self) -> &[Limb] {
        &self.limbs
    }

    /// Big-endian byte encoding of the magnitude (sign is not encoded).
    pub fn get_bytes_be(&self) -> Vec<u8> {
        if self.limbs.is_empty() {
            return vec![0];
        }
        let mut out = Vec::with_capacity(self.limbs.len() * 8);
        for &l in self.limbs.iter().rev() {
            out.extend_from_slice(&l.to_be_bytes());
        }
        while out.len() > 1 && out[0] == 0 {
            out.remove(0);
        }
        out
    }

    fn cmp_abs_limbs(a: &[Limb], b: &[Limb]) -> Ordering {
        if a.len() != b.len() {
            return a.len().cmp(&b.len());
        }
        for i in (0..a.len()).rev() {
            if a[i] != b[i] {
                return a[i].cmp(&b[i]);
            }
        }
        Ordering::Equal
    }

    /// Compare magnitudes only, ignoring sign.
    pub fn cmpabs(&self, other: &Mpz) -> Ordering {
        Self::cmp_abs_limbs(&self.limbs, &other.limbs)
    }

    pub fn cmpabs_ui(&self, other: u64) -> Ordering {
        self.cmpabs(&Mpz::from_ui(other))
    }

    /// Signed comparison.
    pub fn cmp(&self, other: &Mpz) -> Ordering {
        match (self.sign(), other.sign()) {
            (0, 0) => Ordering::Equal,
            (a, b) if a != b => a.cmp(&b),
            (1, 1) => self.cmpabs(other),
            (-1, -1) => other.cmpabs(self),
            _ => unreachable!(),
        }
    }

    pub fn cmp_si(&self, other: i64) -> Ordering {
        self.cmp(&Mpz::from_si(other))
    }

    fn add_abs(a: &[Limb], b: &[Limb]) -> Vec<Limb> {
        let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u64;
        for i in 0..long.len() {
            let s = short.get(i).copied().unwrap_or(0);
            let (r1, c1) = long[i].overflowing_add(s);
            let (r2, c2) = r1.overflowing_add(carry);
            out.push(r2);
            carry = (c1 as u64) + (c2 as u64);
        }
        if carry != 0 {
            out.push(carry);
        }
        out
    }

    /// Requires `a >= b` (magnitude).
    fn sub_abs(a: &[Limb], b: &[Limb]) -> Vec<Limb> {
        let mut out = Vec::with_capacity(a.len());
        let mut borrow = 0i64;
        for i in 0..a.len() {
            let s = b.get(i).copied().unwrap_or(0) as i128;
            let d = a[i] as i128 - s - borrow as i128;
            if d < 0 {
                out.push((d + (1i128 << 64)) as u64);
                borrow = 1;
            } else {
                out.push(d as u64);
                borrow = 0;
            }
        }
        while out.last() == Some(&0) {
            out.pop();
        }
        out
    }

    /// `r = a + b`.
    pub fn add(a: &Mpz, b: &Mpz) -> Mpz {
        let mut r = if a.neg == b.neg {
            Mpz { limbs: Self::add_abs(&a.limbs, &b.limbs), neg: a.neg }
        } else {
            match Self::cmp_abs_limbs(&a.limbs, &b.limbs) {
                Ordering::Equal => Mpz::zero(),
                Ordering::Greater => Mpz { limbs: Self::sub_abs(&a.limbs, &b.limbs), neg: a.neg },
                Ordering::Less => Mpz { limbs: Self::sub_abs(&b.limbs, &a.limbs), neg: b.neg },
            }
        };
        r.trim();
        r
    }

    /// `r = a - b`.
    pub fn sub(a: &Mpz, b: &Mpz) -> Mpz {
        Self::add(a, &b.clone().negated())
    }

    fn negated(mut self) -> Self {
        if !self.is_zero() {
            self.neg = !self.neg;
        }
        self
    }

    /// `r = -a`.
    pub fn neg(a: &Mpz) -> Mpz {
        a.clone().negated()
    }

    /// Schoolbook multiplication.
    pub fn mul(a: &Mpz, b: &Mpz) -> Mpz {
        if a.is_zero() || b.is_zero() {
            return Mpz::zero();
        }
        let mut out = vec![0u64; a.limbs.len() + b.limbs.len()];
        for (i, &ai) in a.limbs.iter().enumerate() {
            let mut carry: u128 = 0;
            for (j, &bj) in b.limbs.iter().enumerate() {
                let idx = i + j;
                let prod = (ai as u128) * (bj as u128) + out[idx] as u128 + carry;
                out[idx] = prod as u64;
                carry = prod >> 64;
            }
            let mut k = i + b.limbs.len();
            while carry != 0 {
                let s = out[k] as u128 + carry;
                out[k] = s as u64;
                carry = s >> 64;
                k += 1;
            }
        }
        let mut r = Mpz { limbs: out, neg: a.neg != b.neg };
        r.trim();
        r
    }

    /// `r += a * b`.
    pub fn addmul(r: &Mpz, a: &Mpz, b: &Mpz) -> Mpz {
        Self::add(r, &Self::mul(a, b))
    }

    /// `r -= a * b`.
    pub fn submul(r: &Mpz, a: &Mpz, b: &Mpz) -> Mpz {
        Self::sub(r, &Self::mul(a, b))
    }

    pub fn pow_ui(a: &Mpz, mut e: u64) -> Mpz {
        let mut base = a.clone();
        let mut result = Mpz::from_ui(1);
        while e != 0 {
            if e & 1 == 1 {
                result = Self::mul(&result, &base);
            }
            base = Self::mul(&base, &base);
            e >>= 1;
        }
        result
    }

    /// `r = a << n` (bits).
    pub fn mul_2exp(a: &Mpz, n: u32) -> Mpz {
        if a.is_zero() || n == 0 {
            return a.clone();
        }
        let word_shift = (n / 64) as usize;
        let bit_shift = n % 64;
        let mut out = vec![0u64; a.limbs.len() + word_shift + 1];
        for (i, &l) in a.limbs.iter().enumerate() {
            let idx = i + word_shift;
            if bit_shift == 0 {
                out[idx] |= l;
            } else {
                out[idx] |= l << bit_shift;
                out[idx + 1] |= l >> (64 - bit_shift);
            }
        }
        let mut r = Mpz { limbs: out, neg: a.neg };
        r.trim();
        r
    }

    /// `r = a >> n` (arithmetic floor shift on the magnitude; sign is kept
    /// as-is, matching the source's `divquo_2exp` semantics of a plain
    /// magnitude shift).
    pub fn divquo_2exp(a: &Mpz, n: u32) -> Mpz {
        if a.is_zero() {
            return Mpz::zero();
        }
        let word_shift = (n / 64) as usize;
        let bit_shift = n % 64;
        if word_shift >= a.limbs.len() {
            return Mpz::zero();
        }
        let src = &a.limbs[word_shift..];
        let mut out = vec![0u64; src.len()];
        for i in 0..src.len() {
            let mut v = src[i] >> bit_shift;
            if bit_shift != 0 && i + 1 < src.len() {
                v |= src[i + 1] << (64 - bit_shift);
            }
            out[i] = v;
        }
        let mut r = Mpz { limbs: out, neg: a.neg };
        r.trim();
        r
    }

    /// Floored division: `n = q*d + r`, `0 <= r < |d|`.
    pub fn div(n: &Mpz, d: &Mpz) -> Result<(Mpz, Mpz), MpzError> {
        if d.is_zero() {
            return Err(MpzError::DivisionByZero);
        }
        let (q_mag, r_mag) = Self::divmod_abs(&n.limbs, &d.limbs);
        let mut q = Mpz { limbs: q_mag, neg: false };
        let mut r = Mpz { limbs: r_mag, neg: false };
        // Truncated quotient/remainder from divmod_abs satisfy
        // |n| = |q|*|d| + |r|, 0 <= |r| < |d|. Convert to floored form.
        let want_neg_q = n.neg != d.neg;
        if want_neg_q && !r.is_zero() {
            q = Self::add(&q, &Mpz::from_ui(1));
            r = Self::sub(&d.clone().abs(), &r);
        }
        q.neg = want_neg_q && !q.is_zero();
        r.trim();
        q.trim();
        Ok((q, r))
    }

    fn abs(mut self) -> Self {
        self.neg = false;
        self
    }

    /// Plain schoolbook long division on magnitudes, truncated toward zero.
    fn divmod_abs(n: &[Limb], d: &[Limb]) -> (Vec<Limb>, Vec<Limb>) {
        if Self::cmp_abs_limbs(n, d) == Ordering::Less {
            return (Vec::new(), n.to_vec());
        }
        // Binary long division, MSB-first, one bit of quotient per step.
        let total_bits = n.len() * 64;
        let mut remainder: Vec<Limb> = Vec::new();
        let mut quotient = vec![0u64; n.len()];
        for bit in (0..total_bits).rev() {
            // remainder = remainder << 1 | bit(n, bit)
            Self::shl1_inplace(&mut remainder);
            let word = bit / 64;
            let off = bit % 64;
            let b = (n.get(word).copied().unwrap_or(0) >> off) & 1;
            if b == 1 {
                if remainder.is_empty() {
                    remainder.push(1);
                } else {
                    remainder[0] |= 1;
                }
            }
            if Self::cmp_abs_limbs(&remainder, d) != Ordering::Less {
                remainder = Self::sub_abs(&remainder, d);
                quotient[bit / 64] |= 1u64 << (bit % 64);
            }
        }
        while quotient.last() == Some(&0) {
            quotient.pop();
        }
        (quotient, remainder)
    }

    fn shl1_inplace(v: &mut Vec<Limb>) {
        let mut carry = 0u64;
        for limb in v.iter_mut() {
            let new_carry = *limb >> 63;
            *limb = (*limb << 1) | carry;
            carry = new_carry;
        }
        if carry != 0 {
            v.push(carry);
        }
    }

    /// Barrett reduction of `x mod m` using a precomputed reciprocal `mu =
    /// floor(2^(2*64*k) / m)` for a `k`-limb modulus. Performs at most two
    /// final correction subtractions.
    pub fn mod_barrett(x: &Mpz, m: &Mpz, k: usize, mu: &Mpz) -> Result<Mpz, MpzError> {
        if m.is_zero() {
            return Err(MpzError::ZeroModulus);
        }
        // q1 = x >> (64*(k-1)), q2 = q1*mu, q3 = q2 >> (64*(k+1))
        let shift1 = 64 * (k.saturating_sub(1)) as u32;
        let q1 = Self::divquo_2exp(x, shift1);
        let q2 = Self::mul(&q1, mu);
        let shift2 = 64 * (k as u32 + 1);
        let q3 = Self::divquo_2exp(&q2, shift2);
        let mut r = Self::sub(x, &Self::mul(&q3, m));
        let m_abs = m.clone().abs();
        while r.cmp(&Mpz::zero()) == Ordering::Less {
            r = Self::add(&r, &m_abs);
        }
        while r.cmpabs(&m_abs) != Ordering::Less {
            r = Self::sub(&r, &m_abs);
        }
        Ok(r)
    }

    /// Build the Barrett reciprocal `mu = floor(2^(2*64*k) / m)`.
    pub fn barrett_mu(m: &Mpz, k: usize) -> Result<Mpz, MpzError> {
        if m.is_zero() {
            return Err(MpzError::ZeroModulus);
        }
        let mut numerator = Mpz::from_ui(1);
        numerator = Self::mul_2exp(&numerator, 2 * 64 * k as u32);
        let (q, _) = Self::div(&numerator, m)?;
        Ok(q)
    }

    /// Non-negative GCD.
    pub fn gcd(a: &Mpz, b: &Mpz) -> Mpz {
        let (_, _, g) = Self::xgcd_impl(a, b);
        g
    }

    /// Extended Euclid: returns `(x, y, g)` with `a*x + b*y = g`, `g >= 0`,
    /// and (for non-zero inputs) `|x| <= |b/(2g)|`, `|y| <= |a/(2g)|`. The
    /// source swaps inputs internally when `b > a`; we keep the exposed
    /// contract symmetric per the Open Question in §9 and do not expose a
    /// particular sign convention beyond the identity itself.
    pub fn xgcd(a: &Mpz, b: &Mpz) -> (Mpz, Mpz, Mpz) {
        Self::xgcd_impl(a, b)
    }

    fn xgcd_impl(a: &Mpz, b: &Mpz) -> (Mpz, Mpz, Mpz) {
        let mut old_r = a.clone();
        let mut r = b.clone();
        let mut old_s = Mpz::from_ui(1);
        let mut s = Mpz::zero();
        let mut old_t = Mpz::zero();
        let mut t = Mpz::from_ui(1);

        while !r.is_zero() {
            let (q, rem) = Self::div(&old_r, &r).expect("r checked non-zero by loop guard");
            old_r = r;
            r = rem;
            let new_s = Self::sub(&old_s, &Self::mul(&q, &s));
            old_s = s;
            s = new_s;
            let new_t = Self::sub(&old_t, &Self::mul(&q, &t));
            old_t = t;
            t = new_t;
        }

        let mut g = old_r;
        let (mut x, mut y) = (old_s, old_t);
        if g.is_neg() {
            g = Self::neg(&g);
            x = Self::neg(&x);
            y = Self::neg(&y);
        }
        (x, y, g)
    }

    /// `out * a = 1 (mod m)`, `out in [0, |m|)`. Fails unless `gcd(a,m)=1`.
    pub fn invmod(a: &Mpz, m: &Mpz) -> Result<Mpz, MpzError> {
        let m_abs = m.clone().abs();
        if m_abs.cmpabs_ui(1) == Ordering::Equal {
            return Ok(Mpz::zero());
        }
        if a.is_zero() {
            return Err(MpzError::NotInvertible);
        }
        let (x, _y, g) = Self::xgcd_impl(a, &m_abs);
        if !g.is_one() {
            return Err(MpzError::NotInvertible);
        }
        let (_, r) = Self::div(&x, &m_abs).expect("m_abs checked non-zero above");
        Ok(r)
    }

    /// CRT reconstruction: given `a (mod a_m)` and `b (mod b_m)`, produce
    /// the combination minimized in absolute value.
    ///
    /// `s = (b - (a mod b_m)) * m_inv (mod b_m)`, `t = a + a_m*s`, and the
    /// result is whichever of `t` and `t - ab_m` has smaller magnitude.
    pub fn crt(a: &Mpz, a_m: &Mpz, b: &Mpz, b_m: &Mpz, m_inv: &Mpz, ab_m: &Mpz) -> Result<Mpz, MpzError> {
        let (_, a_mod_bm) = Self::div(a, b_m)?;
        let diff = Self::sub(b, &a_mod_bm);
        let s_unreduced = Self::mul(&diff, m_inv);
        let (_, s) = Self::div(&s_unreduced, b_m)?;
        let t = Self::add(a, &Self::mul(a_m, &s));
        let alt = Self::sub(&t, ab_m);
        if t.cmpabs(&alt) == Ordering::Greater {
            Ok(alt)
        } else {
            Ok(t)
        }
    }
}

impl PartialEq for Mpz {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Mpz {}

impl PartialOrd for Mpz {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Mpz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        if self.neg {
            write!(f, "-")?;
        }
        write!(f, "0x")?;
        for (i, &l) in self.limbs.iter().rev().enumerate() {
            if i == 0 {
                write!(f, "{l:x}")?;
            } else {
                write!(f, "{l:016x}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_sub_is_identity() {
        let a = Mpz::from_si(12345);
        let b = Mpz::from_si(-678);
        let sum = Mpz::add(&a, &b);
        let back = Mpz::sub(&sum, &b);
        assert_eq!(back, a);
    }

    #[test]
    fn mul_matches_small_values() {
        let a = Mpz::from_si(123456789);
        let b = Mpz::from_si(-987654321);
        let p = Mpz::mul(&a, &b);
        assert_eq!(p.get_si(), -121932631112635269i64);
    }

    #[test]
    fn div_is_floored_with_nonneg_remainder() {
        let n = Mpz::from_si(-7);
        let d = Mpz::from_si(2);
        let (q, r) = Mpz::div(&n, &d).unwrap();
        assert_eq!(q.get_si(), -4);
        assert_eq!(r.get_si(), 1);
        let check = Mpz::add(&Mpz::mul(&q, &d), &r);
        assert_eq!(check, n);
    }

    #[test]
    fn div_by_zero_fails() {
        assert_eq!(Mpz::div(&Mpz::from_ui(1), &Mpz::zero()), Err(MpzError::DivisionByZero));
    }

    #[test]
    fn invmod_round_trips() {
        let a = Mpz::from_ui(7);
        let m = Mpz::from_ui(26);
        let inv = Mpz::invmod(&a, &m).unwrap();
        let prod = Mpz::mul(&a, &inv);
        let (_, r) = Mpz::div(&prod, &m).unwrap();
        assert_eq!(r.get_ui(), 1);
    }

    #[test]
    fn invmod_non_coprime_fails() {
        assert_eq!(Mpz::invmod(&Mpz::from_ui(4), &Mpz::from_ui(8)), Err(MpzError::NotInvertible));
    }

    #[test]
    fn xgcd_identity_holds_symmetric() {
        for (a, b) in [(240i64, 46i64), (46, 240), (-240, 46), (0, 5), (5, 0)] {
            let ma = Mpz::from_si(a);
            let mb = Mpz::from_si(b);
            let (x, y, g) = Mpz::xgcd(&ma, &mb);
            let lhs = Mpz::add(&Mpz::mul(&ma, &x), &Mpz::mul(&mb, &y));
            assert_eq!(lhs, g, "a={a} b={b}");
            assert!(!g.is_neg());
        }
    }

    #[test]
    fn gcd_matches_known_value() {
        assert_eq!(Mpz::gcd(&Mpz::from_si(240), &Mpz::from_si(46)).get_ui(), 2);
    }

    #[test]
    fn barrett_matches_plain_div() {
        let m = Mpz::from_ui(97);
        let mu = Mpz::barrett_mu(&m, 1).unwrap();
        for v in [0u64, 1, 96, 97, 98, 10000, 9699] {
            let x = Mpz::from_ui(v);
            let (_, expected) = Mpz::div(&x, &m).unwrap();
            let got = Mpz::mod_barrett(&x, &m, 1, &mu).unwrap();
            assert_eq!(got, expected, "v={v}");
        }
    }

    #[test]
    fn crt_reconstructs_small_example() {
        // a=2 (mod 3), b=3 (mod 5) -> unique x in (-7,8] with x=2 mod3, x=3 mod5 is x=8 or x=-7
        let a_m = Mpz::from_ui(3);
        let b_m = Mpz::from_ui(5);
        let ab_m = Mpz::from_ui(15);
        let m_inv = Mpz::invmod(&a_m, &b_m).unwrap(); // 3^-1 mod 5 = 2
        let result = Mpz::crt(&Mpz::from_ui(2), &a_m, &Mpz::from_ui(3), &b_m, &m_inv, &ab_m).unwrap();
        let (_, r3) = Mpz::div(&result, &a_m).unwrap();
        let (_, r5) = Mpz::div(&result, &b_m).unwrap();
        assert_eq!(r3.get_ui(), 2);
        assert_eq!(r5.get_ui(), 3);
    }

    #[test]
    fn add_overflow_grows_by_at_most_one_limb() {
        let a = Mpz::from_ui(u64::MAX);
        let b = Mpz::from_ui(1);
        let sum = Mpz::add(&a, &b);
        assert_eq!(sum.get_limbs().len(), 2);
    }
}
