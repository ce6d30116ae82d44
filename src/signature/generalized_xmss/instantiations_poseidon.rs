//! Shipped parameter sets, named by lifetime, encoding dimension, and chain
//! base. All of them use the target-sum encoding with the target set to the
//! expected digit sum.

use super::GeneralizedXMSSSignatureScheme;
use crate::inc_encoding::target_sum::TargetSumEncoding;
use crate::symmetric::message_hash::poseidon::PoseidonMessageHash;
use crate::symmetric::prf::shake_to_field::ShakePRFtoF;
use crate::symmetric::tweak_hash::poseidon::PoseidonTweakHash;

const DIMENSION: usize = 64;
const BASE: usize = 8;
const MAX_CHUNK_VALUE: usize = BASE - 1;
const TARGET_SUM: usize = DIMENSION * MAX_CHUNK_VALUE / 2;

/// Hash length in field elements, for chain values and tree nodes.
/// Bounded by the narrow permutation width: parameter, tweak, and two
/// sibling nodes must fit into one width-16 state.
const HASH_LEN_FE: usize = 5;
/// Message-hash output length in field elements.
const MSG_HASH_LEN_FE: usize = 8;
/// Parameter length in field elements.
const PARAMETER_LEN_FE: usize = 4;
/// Tweak length in field elements, enough for all tweak variants.
const TWEAK_LEN_FE: usize = 2;
/// Randomizer length in field elements.
const RAND_LEN_FE: usize = 6;
/// Message length in field elements, three bytes per element.
const MSG_LEN_FE: usize = 11;
/// Sponge capacity in field elements.
const CAPACITY: usize = 9;

type Prf = ShakePRFtoF<HASH_LEN_FE, RAND_LEN_FE>;
type Th = PoseidonTweakHash<PARAMETER_LEN_FE, HASH_LEN_FE, TWEAK_LEN_FE, CAPACITY, DIMENSION>;
type Mh = PoseidonMessageHash<
    PARAMETER_LEN_FE,
    RAND_LEN_FE,
    MSG_HASH_LEN_FE,
    DIMENSION,
    BASE,
    TWEAK_LEN_FE,
    MSG_LEN_FE,
>;
type Ie = TargetSumEncoding<Mh, TARGET_SUM>;

pub mod lifetime_2_to_the_8 {
    use super::*;

    /// Lifetime 2^8, 64 chains of length 8, target sum 224.
    /// Intended for short-lived keys and integration testing.
    pub type SIGTargetSumLifetime8Dim64Base8 = GeneralizedXMSSSignatureScheme<Prf, Ie, Th, 8>;
}

pub mod lifetime_2_to_the_18 {
    use super::*;

    /// Lifetime 2^18, 64 chains of length 8, target sum 224.
    /// With one epoch per second, a key lasts about three days.
    pub type SIGTargetSumLifetime18Dim64Base8 = GeneralizedXMSSSignatureScheme<Prf, Ie, Th, 18>;
}
