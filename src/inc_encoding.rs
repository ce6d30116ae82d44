use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};

use crate::MESSAGE_LENGTH;

/// Trait to model an incomparable encoding scheme: a randomized mapping from
/// messages to codewords of `DIMENSION` chunks, each in `[0, BASE)`, such
/// that no valid codeword dominates another component-wise.
///
/// Encoding may fail for a given randomness; callers retry with fresh
/// randomness up to `MAX_TRIES` times.
pub trait IncomparableEncoding {
    type Parameter;
    type Randomness: Serialize + DeserializeOwned;
    type Error;

    /// number of chunks in a codeword
    const DIMENSION: usize;

    /// how often encoding should be retried before giving up.
    /// Exceeding this bound indicates a misconfigured parameter set,
    /// not a transient condition.
    const MAX_TRIES: usize;

    /// each chunk is between 0 and BASE - 1
    const BASE: usize;

    /// Samples a fresh encoding randomness.
    fn rand<R: Rng>(rng: &mut R) -> Self::Randomness;

    /// Tries to encode the message with the given randomness. Returns the
    /// codeword chunks, or an error if this randomness does not yield a
    /// valid codeword.
    fn encode(
        parameter: &Self::Parameter,
        message: &[u8; MESSAGE_LENGTH],
        randomness: &Self::Randomness,
        epoch: u32,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod basic_winternitz;
pub mod target_sum;
