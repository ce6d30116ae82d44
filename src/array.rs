use serde::{Deserialize, Deserializer, Serialize, de::Visitor};
use std::ops::{Deref, DerefMut};

use crate::F;

/// A wrapper around an array of field elements with length-agnostic serde.
///
/// Elements are serialized as their canonical `u32` representatives;
/// deserialization re-validates that every value is below the modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FieldArray<const N: usize>(pub [F; N]);

impl<const N: usize> Deref for FieldArray<N> {
    type Target = [F; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for FieldArray<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<[F; N]> for FieldArray<N> {
    fn from(arr: [F; N]) -> Self {
        Self(arr)
    }
}

impl<const N: usize> From<FieldArray<N>> for [F; N] {
    fn from(field_array: FieldArray<N>) -> Self {
        field_array.0
    }
}

impl<const N: usize> Serialize for FieldArray<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|elem| elem.as_canonical_u32()))
    }
}

impl<'de, const N: usize> Deserialize<'de> for FieldArray<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldArrayVisitor<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for FieldArrayVisitor<N> {
            type Value = FieldArray<N>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "an array of {N} field elements")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut arr = [F::ZERO; N];
                for (i, p) in arr.iter_mut().enumerate() {
                    let val: u32 = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                    *p = F::from_canonical_checked(val).map_err(serde::de::Error::custom)?;
                }
                Ok(FieldArray(arr))
            }
        }

        deserializer.deserialize_seq(FieldArrayVisitor::<N>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_equality() {
        let arr1 = FieldArray([F::new(1), F::new(2), F::new(3)]);
        let arr2 = FieldArray([F::new(1), F::new(2), F::new(3)]);
        let arr3 = FieldArray([F::new(1), F::new(2), F::new(4)]);

        assert_eq!(arr1, arr2);
        assert_ne!(arr1, arr3);
        assert_ne!(arr2, arr3);
    }

    #[test]
    fn test_random_arrays_differ() {
        let mut rng = rand::rng();
        let a: FieldArray<5> = FieldArray(rng.random());
        let b: FieldArray<5> = FieldArray(rng.random());
        // Astronomically unlikely to collide.
        assert_ne!(a, b);
    }
}
