use crate::array::FieldArray;
use crate::symmetric::tweak_hash::poseidon::poseidon_compress;
use crate::{F, MESSAGE_LENGTH, TWEAK_SEPARATOR_FOR_MESSAGE_HASH, poseidon2_24};

use super::MessageHash;

/// Number of message bytes packed into one field element.
const BYTES_PER_FE: usize = 3;

/// Encodes a message as field elements, three bytes per element.
///
/// Each element stays below 2^24 < p, so the packing is injective.
#[must_use]
pub fn encode_message<const MSG_LEN_FE: usize>(message: &[u8; MESSAGE_LENGTH]) -> [F; MSG_LEN_FE] {
    std::array::from_fn(|i| {
        let mut acc: u32 = 0;
        for j in 0..BYTES_PER_FE {
            let byte_index = i * BYTES_PER_FE + j;
            if byte_index < MESSAGE_LENGTH {
                acc |= u32::from(message[byte_index]) << (8 * j);
            }
        }
        F::new(acc)
    })
}

/// Encodes an epoch as field elements, tagged with the message-hash separator
/// and decomposed in base-p, mirroring the tree and chain tweak encodings.
#[must_use]
pub fn encode_epoch<const TWEAK_LEN_FE: usize>(epoch: u32) -> [F; TWEAK_LEN_FE] {
    let mut acc = (u64::from(epoch) << 8) | u64::from(TWEAK_SEPARATOR_FOR_MESSAGE_HASH);
    std::array::from_fn(|_| {
        let digit = acc % u64::from(F::ORDER_U32);
        acc /= u64::from(F::ORDER_U32);
        F::from_u64(digit)
    })
}

/// A message hash implemented using the width-24 permutation.
///
/// The input `rho ++ parameter ++ epoch ++ message` is compressed to
/// `HASH_LEN_FE` field elements, and each element is split into
/// `DIMENSION / HASH_LEN_FE` base-`BASE` digits.
///
/// Note: PARAMETER_LEN, RAND_LEN, HASH_LEN_FE, TWEAK_LEN_FE, and MSG_LEN_FE
/// must be given in the unit "number of field elements".
pub struct PoseidonMessageHash<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const HASH_LEN_FE: usize,
    const DIMENSION: usize,
    const BASE: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
>;

impl<
    const PARAMETER_LEN: usize,
    const RAND_LEN: usize,
    const HASH_LEN_FE: usize,
    const DIMENSION: usize,
    const BASE: usize,
    const TWEAK_LEN_FE: usize,
    const MSG_LEN_FE: usize,
> MessageHash
    for PoseidonMessageHash<PARAMETER_LEN, RAND_LEN, HASH_LEN_FE, DIMENSION, BASE, TWEAK_LEN_FE, MSG_LEN_FE>
{
    type Parameter = FieldArray<PARAMETER_LEN>;

    type Randomness = FieldArray<RAND_LEN>;

    const DIMENSION: usize = DIMENSION;

    const BASE: usize = BASE;

    fn rand<R: rand::Rng>(rng: &mut R) -> Self::Randomness {
        FieldArray(rng.random())
    }

    fn apply(
        parameter: &Self::Parameter,
        epoch: u32,
        randomness: &Self::Randomness,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Vec<u8> {
        let epoch_fe = encode_epoch::<TWEAK_LEN_FE>(epoch);
        let message_fe = encode_message::<MSG_LEN_FE>(message);

        let combined_input: Vec<F> = randomness
            .iter()
            .chain(parameter.iter())
            .chain(epoch_fe.iter())
            .chain(message_fe.iter())
            .copied()
            .collect();

        let perm = poseidon2_24();
        let hash: [F; HASH_LEN_FE] = poseidon_compress::<_, 24, HASH_LEN_FE>(&perm, &combined_input);

        // Split every hash element into base-BASE digits, lowest digit first.
        let digits_per_fe = DIMENSION / HASH_LEN_FE;
        let mut chunks = Vec::with_capacity(DIMENSION);
        for fe in hash {
            let mut acc = fe.as_canonical_u32();
            for _ in 0..digits_per_fe {
                chunks.push((acc % BASE as u32) as u8);
                acc /= BASE as u32;
            }
        }
        chunks
    }

    #[cfg(test)]
    fn internal_consistency_check() {
        assert!(
            BASE <= 1 << 8,
            "Poseidon Message Hash: Base must be at most 2^8"
        );
        assert!(
            DIMENSION.is_multiple_of(HASH_LEN_FE),
            "Poseidon Message Hash: Dimension must be a multiple of the hash length"
        );
        let digits_per_fe = DIMENSION / HASH_LEN_FE;
        assert!(
            (BASE as u64).checked_pow(digits_per_fe as u32).is_some_and(|b| b <= 1 << 31),
            "Poseidon Message Hash: too many digits per field element for this base"
        );
        assert!(
            MSG_LEN_FE * BYTES_PER_FE >= MESSAGE_LENGTH,
            "Poseidon Message Hash: not enough field elements to encode the message"
        );
        assert!(
            RAND_LEN + PARAMETER_LEN + TWEAK_LEN_FE + MSG_LEN_FE <= 24,
            "Poseidon Message Hash: input lengths too large for the width-24 permutation"
        );
        assert!(
            HASH_LEN_FE <= 24,
            "Poseidon Message Hash: output length too large for the width-24 permutation"
        );

        let bits_per_fe = f64::floor(f64::log2(F::ORDER_U32 as f64));
        let tweak_fe_bits = bits_per_fe * TWEAK_LEN_FE as f64;
        assert!(
            tweak_fe_bits >= f64::from(32 + 8_u32),
            "Poseidon Message Hash: not enough field elements to encode the epoch tweak"
        );
    }
}

// Example instantiations
#[cfg(test)]
pub type PoseidonMessageHash44 = PoseidonMessageHash<4, 4, 4, 32, 4, 2, 11>;
#[cfg(test)]
pub type PoseidonMessageHashW1 = PoseidonMessageHash<5, 5, 7, 161, 2, 2, 11>;
