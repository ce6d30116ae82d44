use std::fmt::Debug;

use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, de::DeserializeOwned};

use crate::symmetric::prf::Pseudorandom;

/// Trait to model a tweakable hash function.
///
/// Such a function takes a public parameter, a tweak, and a message to be
/// hashed. The tweak acts as a domain separator: structurally different uses
/// (hashing within a chain, merging two tree nodes, hashing all chain ends
/// into a leaf) never collide because their tweaks never collide.
pub trait TweakableHash: Sized + Send + Sync {
    type Parameter: Copy + PartialEq + Serialize + DeserializeOwned + Send + Sync;
    type Tweak;
    type Domain: Copy + PartialEq + Eq + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// Generates a random public parameter.
    fn rand_parameter<R: Rng>(rng: &mut R) -> Self::Parameter;

    /// Generates a random domain element.
    fn rand_domain<R: Rng>(rng: &mut R) -> Self::Domain;

    /// Returns a tweak to be used in the Merkle tree.
    /// Note: this is the tweak of the hash producing the node at the given
    /// level, so level 0 tweaks belong to the leaf hashes.
    fn tree_tweak(level: u8, pos_in_level: u32) -> Self::Tweak;

    /// Returns a tweak to be used in chains.
    /// Note: this is the tweak of the hash producing the chain element at the
    /// given position, so position 0 never occurs as a tweak.
    fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self::Tweak;

    /// Applies the tweakable hash to parameter, tweak, and message.
    fn apply(
        parameter: &Self::Parameter,
        tweak: &Self::Tweak,
        message: &[Self::Domain],
    ) -> Self::Domain;

    /// Computes one layer of a Merkle tree: children are paired two-by-two
    /// and hashed with the tweak of the parent level. Pairs are independent,
    /// so they are processed in parallel; the result does not depend on the
    /// execution order.
    ///
    /// `level` is the level of the parents, `parent_start` the position of
    /// the first parent in that level. `children.len()` must be even.
    fn compute_tree_layer(
        parameter: &Self::Parameter,
        level: u8,
        parent_start: usize,
        children: &[Self::Domain],
    ) -> Vec<Self::Domain> {
        debug_assert!(children.len().is_multiple_of(2));
        children
            .par_chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| {
                let pos = (parent_start + i) as u32;
                Self::apply(parameter, &Self::tree_tweak(level, pos), pair)
            })
            .collect()
    }

    /// Computes the Merkle leaves of the given epochs: for each epoch, all
    /// chains are walked from their PRF-derived starts to their ends, and the
    /// ends are hashed into the leaf. Epochs are independent and processed in
    /// parallel.
    fn compute_tree_leaves<PRF>(
        prf_key: &PRF::Key,
        parameter: &Self::Parameter,
        epochs: &[u32],
        num_chains: usize,
        chain_length: usize,
    ) -> Vec<Self::Domain>
    where
        PRF: Pseudorandom,
        PRF::Domain: Into<Self::Domain>,
    {
        epochs
            .par_iter()
            .map(|&epoch| {
                let chain_ends: Vec<Self::Domain> = (0..num_chains)
                    .map(|chain_index| {
                        let start =
                            PRF::get_domain_element(prf_key, epoch, chain_index as u64).into();
                        chain::<Self>(
                            parameter,
                            epoch,
                            chain_index as u8,
                            0,
                            chain_length - 1,
                            &start,
                        )
                    })
                    .collect();
                Self::apply(parameter, &Self::tree_tweak(0, epoch), &chain_ends)
            })
            .collect()
    }

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

/// Function implementing hash chains, implemented over a tweakable hash function.
/// The chain is specific to an epoch `epoch`, and an index `chain_index`.
/// `start_pos_in_chain` is the position of the start value in the chain,
/// and `steps` is the number of hash applications.
///
/// This function also needs the parameter of the tweakable hash.
pub fn chain<TH: TweakableHash>(
    parameter: &TH::Parameter,
    epoch: u32,
    chain_index: u8,
    start_pos_in_chain: u8,
    steps: usize,
    start: &TH::Domain,
) -> TH::Domain {
    // keep track of what we have already computed
    let mut current = *start;

    // otherwise, walk the right amount of steps
    for j in 0..steps {
        let pos = start_pos_in_chain as usize + j + 1;
        let tweak = TH::chain_tweak(epoch, chain_index, pos as u8);
        current = TH::apply(parameter, &tweak, &[current]);
    }

    current
}

pub mod poseidon;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetric::tweak_hash::poseidon::PoseidonTweak44;
    use proptest::prelude::*;

    type TestTH = PoseidonTweak44;

    proptest! {
        #[test]
        fn proptest_chain_associativity(
            total_steps in 0usize..16,
            split in 0usize..16,
        ) {
            // walking the chain in two parts must be the same as walking it
            // in one go
            prop_assume!(split <= total_steps);

            let mut rng = rand::rng();
            let parameter = TestTH::rand_parameter(&mut rng);
            let start = TestTH::rand_domain(&mut rng);
            let epoch = 9;
            let chain_index = 20;

            let full = chain::<TestTH>(&parameter, epoch, chain_index, 0, total_steps, &start);

            let intermediate =
                chain::<TestTH>(&parameter, epoch, chain_index, 0, split, &start);
            let rest = chain::<TestTH>(
                &parameter,
                epoch,
                chain_index,
                split as u8,
                total_steps - split,
                &intermediate,
            );

            prop_assert_eq!(full, rest);
        }

        #[test]
        fn proptest_chain_zero_steps_is_identity(seed_epoch in any::<u32>()) {
            let mut rng = rand::rng();
            let parameter = TestTH::rand_parameter(&mut rng);
            let start = TestTH::rand_domain(&mut rng);
            let out = chain::<TestTH>(&parameter, seed_epoch, 0, 0, 0, &start);
            prop_assert_eq!(out, start);
        }
    }

    #[test]
    fn test_compute_tree_layer_matches_apply() {
        let mut rng = rand::rng();
        let parameter = TestTH::rand_parameter(&mut rng);
        let children: Vec<_> = (0..8).map(|_| TestTH::rand_domain(&mut rng)).collect();

        let parents = TestTH::compute_tree_layer(&parameter, 3, 10, &children);

        assert_eq!(parents.len(), 4);
        for (i, pair) in children.chunks_exact(2).enumerate() {
            let expected =
                TestTH::apply(&parameter, &TestTH::tree_tweak(3, (10 + i) as u32), pair);
            assert_eq!(parents[i], expected);
        }
    }
}
