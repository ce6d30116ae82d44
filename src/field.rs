use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::Rng;
use rand::distr::{Distribution, StandardUniform};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The field modulus `p = 2^31 - 2^24 + 1`.
const P: u32 = 0x7f00_0001;

/// `p^{-1} mod 2^32`, used by Montgomery reduction.
const MONTY_MU: u32 = 0x8100_0001;

/// Errors for untrusted field-element material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid field element: {value} is not smaller than the modulus {}", P)]
    InvalidFieldElement { value: u32 },
}

/// An element of the prime field with `p = 2^31 - 2^24 + 1`.
///
/// The value is stored in Montgomery form (`R = 2^32`) and is always kept
/// canonical, i.e. the stored representative is `< p`. Conversion back to the
/// canonical integer is lossless via [`Fp::as_canonical_u32`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Fp(u32);

impl Fp {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(to_monty(1));
    pub const TWO: Self = Self(to_monty(2));

    /// The field order as a `u32`.
    pub const ORDER_U32: u32 = P;

    /// Number of bytes in the canonical encoding of one element.
    pub const NUM_BYTES: usize = 4;

    /// Builds an element by reducing a raw integer mod `p`.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(to_monty(value % P))
    }

    /// Validates untrusted input: accepts exactly the canonical range `[0, p)`.
    pub fn from_canonical_checked(value: u32) -> Result<Self, FieldError> {
        if value < P {
            Ok(Self(to_monty(value)))
        } else {
            Err(FieldError::InvalidFieldElement { value })
        }
    }

    /// Builds an element by reducing a `u64` mod `p`.
    #[inline]
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(to_monty((value % P as u64) as u32))
    }

    /// Builds an element by reducing a `u128` mod `p`.
    #[inline]
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(to_monty((value % P as u128) as u32))
    }

    /// The canonical integer representative in `[0, p)`.
    #[inline]
    #[must_use]
    pub const fn as_canonical_u32(self) -> u32 {
        monty_reduce(self.0 as u64)
    }

    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn double(self) -> Self {
        // No overflow: the representative is < p < 2^31.
        let sum = self.0 + self.0;
        if sum >= P { Self(sum - P) } else { Self(sum) }
    }

    /// Exact division by two: the unique `y` with `y + y = self`.
    #[inline]
    #[must_use]
    pub const fn halve(self) -> Self {
        // Halving the Montgomery representative halves the represented value,
        // since R is invertible. An odd representative is lifted by p first.
        let r = self.0;
        if r & 1 == 0 {
            Self(r >> 1)
        } else {
            // r + p fits in u32: r < p < 2^31.
            Self((r + P) >> 1)
        }
    }

    /// Exact division by `2^k` for `k <= 24`.
    ///
    /// Equivalent to multiplying by the modular inverse of `2^k`; callers in
    /// the permutation's internal layer rely on this being a genuine field
    /// division, not an integer shift.
    #[must_use]
    pub const fn div_2exp(self, k: usize) -> Self {
        debug_assert!(k <= 24, "div_2exp only supports exponents up to 24");
        let mut out = self;
        let mut i = 0;
        while i < k {
            out = out.halve();
            i += 1;
        }
        out
    }

    /// Raises the element to the power `exp`.
    #[must_use]
    pub fn exp_u64(self, mut exp: u64) -> Self {
        let mut base = self;
        let mut acc = Self::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc *= base;
            }
            base *= base;
            exp >>= 1;
        }
        acc
    }

    /// The multiplicative inverse, via Fermat's little theorem.
    /// Returns `None` for zero.
    #[must_use]
    pub fn try_inverse(self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(self.exp_u64((P - 2) as u64))
    }

    #[inline]
    #[must_use]
    pub fn cube(self) -> Self {
        self * self * self
    }
}

/// Converts a canonical integer (`< p`) into Montgomery form.
const fn to_monty(value: u32) -> u32 {
    (((value as u64) << 32) % P as u64) as u32
}

/// Montgomery reduction: maps `x < p * 2^32` to `x * 2^{-32} mod p`.
const fn monty_reduce(x: u64) -> u32 {
    let t = (x as u32).wrapping_mul(MONTY_MU) as u64;
    let u = t * P as u64;
    let (x_sub_u, borrow) = x.overflowing_sub(u);
    let hi = (x_sub_u >> 32) as u32;
    if borrow { hi.wrapping_add(P) } else { hi }
}

impl Add for Fp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut sum = self.0.wrapping_add(rhs.0);
        if sum >= P {
            sum -= P;
        }
        Self(sum)
    }
}

impl Sub for Fp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let (diff, borrow) = self.0.overflowing_sub(rhs.0);
        Self(if borrow { diff.wrapping_add(P) } else { diff })
    }
}

impl Mul for Fp {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(monty_reduce(self.0 as u64 * rhs.0 as u64))
    }
}

impl Neg for Fp {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl AddAssign for Fp {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fp {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fp {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for Fp {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Product for Fp {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_canonical_u32())
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_canonical_u32())
    }
}

impl Distribution<Fp> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Fp {
        Fp::new(rng.random_range(0..Fp::ORDER_U32))
    }
}

impl Serialize for Fp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_canonical_u32())
    }
}

impl<'de> Deserialize<'de> for Fp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u32::deserialize(deserializer)?;
        Self::from_canonical_checked(value).map_err(serde::de::Error::custom)
    }
}
