//! The cryptographic permutation underlying every hash mode in this crate.
//!
//! Two fixed widths are used: 16 for chain-step and single-input compression,
//! 24 for pairwise tree compression and the leaf sponge. The permutation is a
//! substitution-permutation network with two round types: external rounds act
//! on the full state, internal rounds on element 0 only, with a cheap
//! diagonal-plus-rank-1 linear layer providing diffusion in between.

use crate::field::Fp;

pub mod constants;

use constants::{DiagEntry, POSEIDON2_16_CONSTANTS, POSEIDON2_24_CONSTANTS, Poseidon2Constants};

/// A keyless permutation over a fixed-width state of field elements.
pub trait CryptographicPermutation<const WIDTH: usize>: Clone + Send + Sync {
    fn permute_mut(&self, state: &mut [Fp; WIDTH]);

    #[must_use]
    fn permute(&self, mut state: [Fp; WIDTH]) -> [Fp; WIDTH] {
        self.permute_mut(&mut state);
        state
    }
}

/// A Poseidon2-style permutation instance for one width.
///
/// Round constants are converted out of the canonical tables once at
/// construction; the tables themselves are fixed data in [`constants`].
#[derive(Clone)]
pub struct Poseidon2<const WIDTH: usize> {
    initial: Vec<[Fp; WIDTH]>,
    terminal: Vec<[Fp; WIDTH]>,
    internal: Vec<Fp>,
    diagonal: &'static [DiagEntry; WIDTH],
}

impl<const WIDTH: usize> Poseidon2<WIDTH> {
    #[must_use]
    pub fn new(constants: &Poseidon2Constants<WIDTH>) -> Self {
        assert!(
            WIDTH.is_multiple_of(4),
            "Permutation: width must be a multiple of 4 for the block linear layer"
        );
        let convert = |round: &[u32; WIDTH]| round.map(Fp::new);
        Self {
            initial: constants.initial.iter().map(convert).collect(),
            terminal: constants.terminal.iter().map(convert).collect(),
            internal: constants.internal.iter().copied().map(Fp::new).collect(),
            diagonal: constants.diagonal,
        }
    }

    /// The external linear layer: a fixed 4x4 matrix applied to each block of
    /// four elements, then an outer circulant step adding to every element the
    /// sum of all elements at the same position mod 4.
    fn external_linear(state: &mut [Fp; WIDTH]) {
        for chunk in state.chunks_exact_mut(4) {
            let (a, b, c, d) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            let t = a + b + c + d;
            chunk[0] = t + a + b.double();
            chunk[1] = t + b + c.double();
            chunk[2] = t + c + d.double();
            chunk[3] = t + d + a.double();
        }
        let mut col_sums = [Fp::ZERO; 4];
        for (i, &x) in state.iter().enumerate() {
            col_sums[i % 4] += x;
        }
        for (i, x) in state.iter_mut().enumerate() {
            *x += col_sums[i % 4];
        }
    }

    /// The internal linear layer: with `s` the state sum, element `i` becomes
    /// `s + c_i * state[i]` for the per-index coefficient table. Index 0
    /// carries `c_0 = -2`, i.e. the sum of all other elements minus itself.
    fn internal_linear(&self, state: &mut [Fp; WIDTH]) {
        let sum: Fp = state.iter().copied().sum();
        for (x, entry) in state.iter_mut().zip(self.diagonal.iter()) {
            *x = sum + apply_diag(*entry, *x);
        }
    }
}

fn apply_diag(entry: DiagEntry, x: Fp) -> Fp {
    match entry {
        DiagEntry::One => x,
        DiagEntry::Two => x.double(),
        DiagEntry::Three => x.double() + x,
        DiagEntry::Four => x.double().double(),
        DiagEntry::NegTwo => -x.double(),
        DiagEntry::NegThree => -(x.double() + x),
        DiagEntry::NegFour => -x.double().double(),
        DiagEntry::InvPow2(k) => x.div_2exp(k),
        DiagEntry::NegInvPow2(k) => -x.div_2exp(k),
    }
}

impl<const WIDTH: usize> CryptographicPermutation<WIDTH> for Poseidon2<WIDTH> {
    fn permute_mut(&self, state: &mut [Fp; WIDTH]) {
        Self::external_linear(state);

        for round_constants in &self.initial {
            for (x, rc) in state.iter_mut().zip(round_constants) {
                *x = (*x + *rc).cube();
            }
            Self::external_linear(state);
        }

        for &rc in &self.internal {
            state[0] = (state[0] + rc).cube();
            self.internal_linear(state);
        }

        for round_constants in &self.terminal {
            for (x, rc) in state.iter_mut().zip(round_constants) {
                *x = (*x + *rc).cube();
            }
            Self::external_linear(state);
        }
    }
}

/// The default width-16 instance.
#[must_use]
pub fn default_poseidon2_16() -> Poseidon2<16> {
    Poseidon2::new(&POSEIDON2_16_CONSTANTS)
}

/// The default width-24 instance.
#[must_use]
pub fn default_poseidon2_24() -> Poseidon2<24> {
    Poseidon2::new(&POSEIDON2_24_CONSTANTS)
}
