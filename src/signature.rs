use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::MESSAGE_LENGTH;
use crate::field::FieldError;

/// Errors raised by signing and by sliding the prepared window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    /// The epoch is outside the interval the key was generated for, or the
    /// prepared window cannot slide any further.
    #[error("epoch {epoch} is outside the activation interval [{start}, {end})")]
    EpochOutOfActivationRange { epoch: u64, start: u64, end: u64 },

    /// The epoch is active but its bottom tree is not in memory yet.
    #[error(
        "epoch {epoch} is outside the prepared interval [{start}, {end}); advance preparation first"
    )]
    EpochNotPrepared { epoch: u64, start: u64, end: u64 },

    /// The target-sum search gave up. This indicates a misconfigured
    /// parameter set, not a transient condition.
    #[error("no valid encoding found after {attempts} attempts; the parameter set is misconfigured")]
    EncodingRetryExhausted { attempts: usize },
}

/// Errors raised by verification on structurally malformed input.
///
/// A well-formed but invalid signature is not an error: verification
/// returns `Ok(false)` for it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("epoch {epoch} is not below the key lifetime {lifetime}")]
    EpochOutOfActivationRange { epoch: u64, lifetime: u64 },

    #[error("signature is malformed: {reason}")]
    MalformedSignature { reason: &'static str },

    #[error(transparent)]
    InvalidFieldElement(#[from] FieldError),
}

/// Trait to model the secret key of a synchronized signature scheme with a
/// sliding preparation window.
///
/// The activation interval is fixed at key generation; the prepared interval
/// is the sub-range of epochs whose bottom trees are currently in memory. It
/// starts at the beginning of the activation interval and only ever moves
/// forward.
pub trait SignatureSchemeSecretKey: Sized {
    /// Epochs this key can ever sign for.
    fn get_activation_interval(&self) -> std::ops::Range<u64>;

    /// Epochs this key can sign for right now.
    fn get_prepared_interval(&self) -> std::ops::Range<u64>;

    /// Slides the prepared interval forward by one block: the oldest retained
    /// bottom tree is dropped and the next one is computed.
    ///
    /// Fails with [`SigningError::EpochOutOfActivationRange`] if the window is
    /// already at the end of the activation interval; the key is unchanged in
    /// that case, and retired epochs are never re-admitted.
    fn advance_preparation(&mut self) -> Result<(), SigningError>;
}

/// Trait to model a synchronized signature scheme. Signing takes the epoch as
/// input, and it is the responsibility of the caller to sign at most once per
/// epoch.
pub trait SignatureScheme {
    type PublicKey: Serialize + DeserializeOwned;
    type SecretKey: SignatureSchemeSecretKey + Serialize + DeserializeOwned;
    type Signature: Serialize + DeserializeOwned;

    /// Total number of epochs supported by the scheme.
    const LIFETIME: u64;

    /// Generates a new key pair, active for `num_active_epochs` epochs
    /// starting at `activation_epoch`. The given rng is the only source of
    /// external randomness in the scheme; everything below key generation is
    /// a pure function of the generated key material.
    ///
    /// Note: implementations may enlarge the requested interval to align it
    /// with internal block boundaries.
    fn key_gen<R: Rng>(
        rng: &mut R,
        activation_epoch: usize,
        num_active_epochs: usize,
    ) -> (Self::PublicKey, Self::SecretKey);

    /// Signs a message for the given epoch. The epoch must be inside the
    /// key's prepared interval.
    fn sign(
        sk: &Self::SecretKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
    ) -> Result<Self::Signature, SigningError>;

    /// Verifies a signature for the given epoch and message.
    ///
    /// Returns `Ok(false)` for a well-formed but invalid signature; raises
    /// [`VerificationError`] only for structurally malformed input. Never
    /// mutates any state.
    fn verify(
        pk: &Self::PublicKey,
        epoch: u32,
        message: &[u8; MESSAGE_LENGTH],
        sig: &Self::Signature,
    ) -> Result<bool, VerificationError>;

    /// Function to check internal consistency of any given parameters.
    /// For testing only, and expected to panic if something is wrong.
    #[cfg(test)]
    fn internal_consistency_check();
}

pub mod generalized_xmss;
