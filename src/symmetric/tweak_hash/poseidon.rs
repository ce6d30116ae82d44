use rand::Rng;
use thiserror::Error;

use crate::TWEAK_SEPARATOR_FOR_CHAIN_HASH;
use crate::TWEAK_SEPARATOR_FOR_TREE_HASH;
use crate::array::FieldArray;
use crate::permutation::CryptographicPermutation;
use crate::poseidon2_16;
use crate::poseidon2_24;
use crate::F;

use super::TweakableHash;

const DOMAIN_PARAMETERS_LENGTH: usize = 4;
/// The state width for compressing a single chain step or a pair of sibling
/// tree nodes.
const COMPRESSION_WIDTH: usize = 16;
/// The state width for the sponge construction hashing many chain ends.
const SPONGE_WIDTH: usize = 24;

/// Errors for untrusted tweak material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TweakError {
    #[error("invalid tweak: unknown separator or out-of-range fields in {packed:#x}")]
    InvalidTweak { packed: u128 },
}

/// Enum to implement tweaks.
#[derive(Debug, PartialEq, Eq)]
pub enum PoseidonTweak {
    TreeTweak {
        level: u8,
        pos_in_level: u32,
    },
    ChainTweak {
        epoch: u32,
        chain_index: u8,
        pos_in_chain: u8,
    },
}

impl PoseidonTweak {
    /// The whole tweak as one big integer. The lowest byte is the separator
    /// reserved for the variant; the packed integer fields sit above it.
    fn to_packed(&self) -> u128 {
        match self {
            Self::TreeTweak {
                level,
                pos_in_level,
            } => {
                ((*level as u128) << 40)
                    | ((*pos_in_level as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_TREE_HASH as u128)
            }
            Self::ChainTweak {
                epoch,
                chain_index,
                pos_in_chain,
            } => {
                ((*epoch as u128) << 24)
                    | ((*chain_index as u128) << 16)
                    | ((*pos_in_chain as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_CHAIN_HASH as u128)
            }
        }
    }

    /// Parses a packed tweak integer, validating the separator and that no
    /// bits beyond the variant's fields are set.
    pub fn from_packed(packed: u128) -> Result<Self, TweakError> {
        let separator = (packed & 0xff) as u8;
        match separator {
            _ if separator == TWEAK_SEPARATOR_FOR_TREE_HASH => {
                if packed >> 48 != 0 {
                    return Err(TweakError::InvalidTweak { packed });
                }
                Ok(Self::TreeTweak {
                    level: (packed >> 40) as u8,
                    pos_in_level: (packed >> 8) as u32,
                })
            }
            _ if separator == TWEAK_SEPARATOR_FOR_CHAIN_HASH => {
                if packed >> 56 != 0 {
                    return Err(TweakError::InvalidTweak { packed });
                }
                Ok(Self::ChainTweak {
                    epoch: (packed >> 24) as u32,
                    chain_index: (packed >> 16) as u8,
                    pos_in_chain: (packed >> 8) as u8,
                })
            }
            _ => Err(TweakError::InvalidTweak { packed }),
        }
    }

    pub fn to_field_elements<const TWEAK_LEN: usize>(&self) -> [F; TWEAK_LEN] {
        // We first represent the entire tweak as one big integer
        let mut acc = self.to_packed();

        // Now we interpret this integer in base-p to get field elements
        std::array::from_fn(|_| {
            let digit = (acc % F::ORDER_U32 as u128) as u64;
            acc /= F::ORDER_U32 as u128;
            F::from_u64(digit)
        })
    }
}

/// Permutation-based compression function.
///
/// Computes `Truncate(Permute(x) + x)`: the input is zero-padded to the
/// permutation width, permuted, the original input is added back element-wise
/// (the feed-forward that makes the public permutation one-way), and the
/// first `OUT_LEN` elements are returned.
///
/// ### Warning: Input Padding
/// The `input` slice is **always silently padded with zeros** to match the
/// permutation's `WIDTH`. Inputs that are distinct but become identical after
/// zero-padding (e.g., `[A, B]` and `[A, B, 0]`) produce the same hash. If a
/// use case requires distinguishing such inputs, the input's length must be
/// encoded externally, as the leaf mode does via its capacity value.
///
/// Panics:
/// - If `input.len() > WIDTH`
/// - If `input.len() < OUT_LEN`
pub fn poseidon_compress<P, const WIDTH: usize, const OUT_LEN: usize>(
    perm: &P,
    input: &[F],
) -> [F; OUT_LEN]
where
    P: CryptographicPermutation<WIDTH>,
{
    assert!(
        input.len() >= OUT_LEN,
        "Poseidon Compression: Input length must be at least output length."
    );

    // Copy the input into a fixed-width buffer, zero-padding unused elements if any.
    let mut padded_input = [F::ZERO; WIDTH];
    padded_input[..input.len()].copy_from_slice(input);

    // Start with the input as the initial state.
    let mut state = padded_input;

    // Apply the permutation in-place.
    perm.permute_mut(&mut state);

    // Feed-forward: Add the input back into the state element-wise.
    for i in 0..WIDTH {
        state[i] += padded_input[i];
    }

    // Truncate and return the first `OUT_LEN` elements of the state.
    state[..OUT_LEN]
        .try_into()
        .expect("OUT_LEN is larger than permutation width")
}

/// Computes a domain separator for the sponge mode by compressing an array of
/// `u32` length parameters through the width-24 permutation.
fn poseidon_safe_domain_separator<P, const OUT_LEN: usize>(
    perm: &P,
    params: &[u32; DOMAIN_PARAMETERS_LENGTH],
) -> [F; OUT_LEN]
where
    P: CryptographicPermutation<SPONGE_WIDTH>,
{
    // Combine params into a single number in base 2^32
    //
    // WARNING: We can use a u128 instead of a big integer only because
    // `params` has 4 elements in base 2^32.
    let mut acc: u128 = 0;
    for &param in params {
        acc = (acc << 32) | (param as u128);
    }

    // Compute base-p decomposition
    let input: [F; SPONGE_WIDTH] = std::array::from_fn(|_| {
        let digit = (acc % F::ORDER_U32 as u128) as u64;
        acc /= F::ORDER_U32 as u128;
        F::from_u64(digit)
    });

    poseidon_compress::<P, SPONGE_WIDTH, OUT_LEN>(perm, &input)
}

/// Permutation-based sponge hash.
///
/// Absorbs an arbitrary-length input and squeezes `OUT_LEN` field elements.
/// Domain separation is achieved by injecting a `capacity_value` into the
/// state.
///
/// ### Sponge Construction
/// This follows the classic sponge structure:
/// - **Absorption**: inputs are added chunk-by-chunk into the first `rate`
///   elements of the state.
/// - **Squeezing**: outputs are read from the first `rate` elements of the
///   state, permuted as needed.
///
/// ### Panics
/// - If `capacity_value.len() >= WIDTH`
fn poseidon_sponge<P, const WIDTH: usize, const OUT_LEN: usize>(
    perm: &P,
    capacity_value: &[F],
    input: &[F],
) -> [F; OUT_LEN]
where
    P: CryptographicPermutation<WIDTH>,
{
    // The capacity length must be strictly smaller than the width to have a
    // non-zero rate.
    assert!(
        capacity_value.len() < WIDTH,
        "Capacity length must be smaller than the state width."
    );
    let rate = WIDTH - capacity_value.len();

    // initialize
    let mut state = [F::ZERO; WIDTH];
    state[rate..].copy_from_slice(capacity_value);

    // absorb all full chunks; zero-padding of a final partial chunk is
    // implicit because absorption only adds into the state
    let mut it = input.chunks_exact(rate);
    for chunk in &mut it {
        for i in 0..chunk.len() {
            state[i] += chunk[i];
        }
        perm.permute_mut(&mut state);
    }
    let remainder = it.remainder();
    if !remainder.is_empty() {
        for (i, x) in remainder.iter().enumerate() {
            state[i] += *x;
        }
        perm.permute_mut(&mut state);
    }

    // squeeze
    let mut out = [F::ZERO; OUT_LEN];
    let mut out_idx = 0;
    while out_idx < OUT_LEN {
        let chunk_size = (OUT_LEN - out_idx).min(rate);
        out[out_idx..out_idx + chunk_size].copy_from_slice(&state[..chunk_size]);
        out_idx += chunk_size;
        if out_idx < OUT_LEN {
            perm.permute_mut(&mut state);
        }
    }
    out
}

/// A tweakable hash function implemented over the two permutation widths.
///
/// Note: HASH_LEN, TWEAK_LEN, CAPACITY, and PARAMETER_LEN must
/// be given in the unit "number of field elements".
#[derive(Clone)]
pub struct PoseidonTweakHash<
    const PARAMETER_LEN: usize,
    const HASH_LEN: usize,
    const TWEAK_LEN: usize,
    const CAPACITY: usize,
    const NUM_CHUNKS: usize,
>;

impl<
    const PARAMETER_LEN: usize,
    const HASH_LEN: usize,
    const TWEAK_LEN: usize,
    const CAPACITY: usize,
    const NUM_CHUNKS: usize,
> TweakableHash for PoseidonTweakHash<PARAMETER_LEN, HASH_LEN, TWEAK_LEN, CAPACITY, NUM_CHUNKS>
{
    type Parameter = FieldArray<PARAMETER_LEN>;

    type Tweak = PoseidonTweak;

    type Domain = FieldArray<HASH_LEN>;

    fn rand_parameter<R: Rng>(rng: &mut R) -> Self::Parameter {
        FieldArray(rng.random())
    }

    fn rand_domain<R: Rng>(rng: &mut R) -> Self::Domain {
        FieldArray(rng.random())
    }

    fn tree_tweak(level: u8, pos_in_level: u32) -> Self::Tweak {
        PoseidonTweak::TreeTweak {
            level,
            pos_in_level,
        }
    }

    fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self::Tweak {
        PoseidonTweak::ChainTweak {
            epoch,
            chain_index,
            pos_in_chain,
        }
    }

    fn apply(
        parameter: &Self::Parameter,
        tweak: &Self::Tweak,
        message: &[Self::Domain],
    ) -> Self::Domain {
        // we are in one of three cases:
        // (1) hashing within chains. We use compression mode, narrow width.
        // (2) hashing two siblings in the tree. We use compression mode, narrow width.
        // (3) hashing a long vector of chain ends. We use sponge mode, wide width.

        let tweak_fe = tweak.to_field_elements::<TWEAK_LEN>();

        match message {
            [single] => {
                // we compress parameter, tweak, message
                let perm = poseidon2_16();
                let combined_input: Vec<F> = parameter
                    .iter()
                    .chain(tweak_fe.iter())
                    .chain(single.iter())
                    .copied()
                    .collect();
                FieldArray(poseidon_compress::<_, COMPRESSION_WIDTH, HASH_LEN>(
                    &perm,
                    &combined_input,
                ))
            }

            [left, right] => {
                // we compress parameter, tweak, message (now containing two parts)
                let perm = poseidon2_16();
                let combined_input: Vec<F> = parameter
                    .iter()
                    .chain(tweak_fe.iter())
                    .chain(left.iter())
                    .chain(right.iter())
                    .copied()
                    .collect();
                FieldArray(poseidon_compress::<_, COMPRESSION_WIDTH, HASH_LEN>(
                    &perm,
                    &combined_input,
                ))
            }

            _ if message.len() > 2 => {
                // Hashing many blocks, e.g., all chain ends of one epoch
                let perm = poseidon2_24();
                let combined_input: Vec<F> = parameter
                    .iter()
                    .chain(tweak_fe.iter())
                    .chain(message.iter().flat_map(|x| x.iter()))
                    .copied()
                    .collect();

                let lengths: [u32; DOMAIN_PARAMETERS_LENGTH] = [
                    PARAMETER_LEN as u32,
                    TWEAK_LEN as u32,
                    NUM_CHUNKS as u32,
                    HASH_LEN as u32,
                ];
                let capacity_value = poseidon_safe_domain_separator::<_, CAPACITY>(&perm, &lengths);
                FieldArray(poseidon_sponge::<_, SPONGE_WIDTH, HASH_LEN>(
                    &perm,
                    &capacity_value,
                    &combined_input,
                ))
            }
            _ => FieldArray([F::ONE; HASH_LEN]), // not reachable: callers never pass an empty message
        }
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            CAPACITY < 24,
            "Poseidon Tweak Chain Hash: Capacity must be less than 24"
        );
        assert!(
            PARAMETER_LEN + TWEAK_LEN + HASH_LEN <= 16,
            "Poseidon Tweak Chain Hash: Input lengths too large for the permutation instance"
        );
        assert!(
            PARAMETER_LEN + TWEAK_LEN + 2 * HASH_LEN <= 16,
            "Poseidon Tweak Tree Hash: Input lengths too large for the permutation instance"
        );

        let bits_per_fe = f64::floor(f64::log2(F::ORDER_U32 as f64));
        let state_bits = bits_per_fe * f64::from(24_u32);
        assert!(
            state_bits >= f64::from((DOMAIN_PARAMETERS_LENGTH * 32) as u32),
            "Poseidon Tweak Leaf Hash: not enough field elements to hash the domain separator"
        );

        let bits_for_tree_tweak = f64::from(32 + 8_u32);
        let bits_for_chain_tweak = f64::from(32 + 8 + 8 + 8_u32);
        let tweak_fe_bits = bits_per_fe * f64::from(TWEAK_LEN as u32);
        assert!(
            tweak_fe_bits >= bits_for_tree_tweak,
            "Poseidon Tweak Hash: not enough field elements to encode the tree tweak"
        );
        assert!(
            tweak_fe_bits >= bits_for_chain_tweak,
            "Poseidon Tweak Hash: not enough field elements to encode the chain tweak"
        );
    }
}

// Example instantiations
#[cfg(test)]
pub type PoseidonTweak44 = PoseidonTweakHash<4, 4, 3, 9, 128>;
#[cfg(test)]
pub type PoseidonTweak34 = PoseidonTweakHash<3, 4, 3, 9, 128>;
#[cfg(test)]
pub type PoseidonTweakW1 = PoseidonTweakHash<5, 4, 2, 9, 161>;
