//! Abstract interface to the homomorphic-encryption ring backend.
//!
//! The engine never touches scheme internals: everything it needs from the
//! backing HE scheme is the commutative-ring surface below, over opaque
//! plaintext and ciphertext slot vectors modulo a fixed prime. Key
//! generation, noise management, and serialization belong to the backend.
//!
//! Every operation is fallible so scheme-level failures (most importantly
//! insufficient remaining multiplicative depth) surface unchanged as
//! [`Error::Backend`](crate::error::Error::Backend); the engine adds no retry
//! logic since those failures are deterministic for fixed parameters.
//!
//! Implementations must be safe for concurrent read-only use: batch phases
//! call these operations from rayon workers with no extra locking.

use crate::error::Result;

/// Ring operations the PSI engine requires from an HE backend.
pub trait HeRing: Sync {
    /// Opaque packed plaintext (one slot per ring position).
    type Plaintext: Clone + Send + Sync;
    /// Opaque ciphertext.
    type Ciphertext: Clone + Send + Sync;

    /// Number of plaintext slots per packed element.
    fn ring_dim(&self) -> usize;

    /// Plaintext modulus p (prime).
    fn plain_modulus(&self) -> u64;

    /// Pack a slot vector into a plaintext. Short inputs are zero-extended
    /// to the ring dimension.
    fn pack(&self, values: &[u64]) -> Result<Self::Plaintext>;

    /// Recover the slot vector of a plaintext.
    fn unpack(&self, pt: &Self::Plaintext) -> Result<Vec<u64>>;

    fn encrypt(&self, pt: &Self::Plaintext) -> Result<Self::Ciphertext>;

    fn decrypt(&self, ct: &Self::Ciphertext) -> Result<Self::Plaintext>;

    fn add(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn add_plain(&self, a: &Self::Ciphertext, b: &Self::Plaintext) -> Result<Self::Ciphertext>;

    fn sub(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn mult(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    fn mult_plain(&self, a: &Self::Ciphertext, b: &Self::Plaintext) -> Result<Self::Ciphertext>;

    fn square(&self, a: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// Cyclic slot rotation by `shift` positions.
    fn rotate(&self, a: &Self::Ciphertext, shift: i32) -> Result<Self::Ciphertext>;

    /// N-ary sum; order-independent.
    fn add_many(&self, cts: &[Self::Ciphertext]) -> Result<Self::Ciphertext>;

    /// N-ary product; order-independent. This is what composes the
    /// OR-across-senders semantics during response aggregation.
    fn mult_many(&self, cts: &[Self::Ciphertext]) -> Result<Self::Ciphertext>;

    /// Noise/level reduction down to `target_level`; a no-op at level 0.
    fn compress(&self, ct: &Self::Ciphertext, target_level: u32) -> Result<Self::Ciphertext>;
}
