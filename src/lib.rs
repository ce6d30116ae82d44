use std::sync::OnceLock;

use crate::permutation::{Poseidon2, default_poseidon2_16, default_poseidon2_24};

/// Message length in bytes, for messages that we want to sign.
pub const MESSAGE_LENGTH: usize = 32;

pub const TWEAK_SEPARATOR_FOR_MESSAGE_HASH: u8 = 0x02;
pub const TWEAK_SEPARATOR_FOR_TREE_HASH: u8 = 0x01;
pub const TWEAK_SEPARATOR_FOR_CHAIN_HASH: u8 = 0x00;

/// The field every hash mode in this crate operates over.
pub type F = crate::field::Fp;

pub(crate) mod array;
pub mod field;
pub mod inc_encoding;
pub mod permutation;
pub mod signature;
pub mod symmetric;

// Cached permutation instances.
//
// Constructing an instance converts the fixed round-constant tables once; we
// cache the two default instances and return a clone. Returning by value
// preserves call sites that take `&perm`.

/// A lazily-initialized, thread-safe cache for the permutation with a width of 24.
static POSEIDON2_24: OnceLock<Poseidon2<24>> = OnceLock::new();

/// A lazily-initialized, thread-safe cache for the permutation with a width of 16.
static POSEIDON2_16: OnceLock<Poseidon2<16>> = OnceLock::new();

/// Errors returned when initializing a custom permutation instance.
#[derive(Debug, thiserror::Error)]
pub enum Poseidon2InitError {
    #[error("permutation for width {width} was already initialized")]
    AlreadyInitialized { width: usize },
}

/// Initialize the width-24 permutation used by this crate.
///
/// This must be called before the first use of the permutation (i.e. before any
/// code paths that compute message/tweak hashes). If not called, the default
/// instance with the baked-in constant tables is used.
pub fn init_poseidon2_24(perm: Poseidon2<24>) -> Result<(), Poseidon2InitError> {
    POSEIDON2_24
        .set(perm)
        .map_err(|_| Poseidon2InitError::AlreadyInitialized { width: 24 })
}

/// Initialize the width-24 permutation using a constructor.
///
/// The constructor will only be called if the permutation has not been initialized yet.
pub fn init_poseidon2_24_with<B>(builder: B) -> Result<(), Poseidon2InitError>
where
    B: FnOnce() -> Poseidon2<24>,
{
    if POSEIDON2_24.get().is_some() {
        return Err(Poseidon2InitError::AlreadyInitialized { width: 24 });
    }
    init_poseidon2_24(builder())
}

/// Initialize the width-16 permutation used by this crate.
///
/// This must be called before the first use of the permutation. If not called,
/// the default instance with the baked-in constant tables is used.
pub fn init_poseidon2_16(perm: Poseidon2<16>) -> Result<(), Poseidon2InitError> {
    POSEIDON2_16
        .set(perm)
        .map_err(|_| Poseidon2InitError::AlreadyInitialized { width: 16 })
}

/// Initialize the width-16 permutation using a constructor.
///
/// The constructor will only be called if the permutation has not been initialized yet.
pub fn init_poseidon2_16_with<B>(builder: B) -> Result<(), Poseidon2InitError>
where
    B: FnOnce() -> Poseidon2<16>,
{
    if POSEIDON2_16.get().is_some() {
        return Err(Poseidon2InitError::AlreadyInitialized { width: 16 });
    }

    init_poseidon2_16(builder())
}

/// Permutation instance (width 24)
pub(crate) fn poseidon2_24() -> Poseidon2<24> {
    POSEIDON2_24.get_or_init(default_poseidon2_24).clone()
}

/// Permutation instance (width 16)
pub(crate) fn poseidon2_16() -> Poseidon2<16> {
    POSEIDON2_16.get_or_init(default_poseidon2_16).clone()
}

#[cfg(test)]
mod poseidon2_init_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::permutation::{default_poseidon2_16, default_poseidon2_24};

    use crate::{
        Poseidon2InitError, init_poseidon2_16, init_poseidon2_16_with, init_poseidon2_24,
        init_poseidon2_24_with, poseidon2_16, poseidon2_24,
    };

    #[test]
    fn init_poseidon2_24_returns_already_initialized_and_does_not_call_builder() {
        // Ensure the OnceLock is initialized (possibly by other tests too).
        let _ = poseidon2_24();

        let calls = AtomicUsize::new(0);
        let res = init_poseidon2_24_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            default_poseidon2_24()
        });

        assert!(matches!(
            res,
            Err(Poseidon2InitError::AlreadyInitialized { width: 24 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let res = init_poseidon2_24(default_poseidon2_24());
        assert!(matches!(
            res,
            Err(Poseidon2InitError::AlreadyInitialized { width: 24 })
        ));
    }

    #[test]
    fn init_poseidon2_16_returns_already_initialized_and_does_not_call_builder() {
        // Ensure the OnceLock is initialized (possibly by other tests too).
        let _ = poseidon2_16();

        let calls = AtomicUsize::new(0);
        let res = init_poseidon2_16_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            default_poseidon2_16()
        });

        assert!(matches!(
            res,
            Err(Poseidon2InitError::AlreadyInitialized { width: 16 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let res = init_poseidon2_16(default_poseidon2_16());
        assert!(matches!(
            res,
            Err(Poseidon2InitError::AlreadyInitialized { width: 16 })
        ));
    }
}
