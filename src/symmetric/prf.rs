use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};

use crate::MESSAGE_LENGTH;

/// Trait to model a pseudorandom function used to expand a fixed-size secret
/// key into per-epoch chain seeds and per-signature randomizer material.
///
/// Every call is a pure function of its explicit inputs: implementations must
/// not read or mutate any global state, so that evaluation order never
/// affects a derived value.
pub trait Pseudorandom {
    type Key: Clone + Serialize + DeserializeOwned + Send + Sync;
    type Domain: Copy + Send + Sync;
    type Randomness;

    /// Samples a fresh PRF key from the given entropy source.
    fn key_gen<R: Rng>(rng: &mut R) -> Self::Key;

    /// Derives the start of the hash chain with the given index in the given
    /// epoch.
    fn get_domain_element(key: &Self::Key, epoch: u32, index: u64) -> Self::Domain;

    /// Derives the randomizer for one signing attempt. The counter is the
    /// attempt index, making the encoding search deterministic per
    /// `(key, epoch, message)`.
    fn get_randomness(
        key: &Self::Key,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
        counter: u64,
    ) -> Self::Randomness;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod shake_to_field;
