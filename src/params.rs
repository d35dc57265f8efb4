//! Protocol parameters for the PSI engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default plaintext modulus: the Fermat prime 2^16 + 1, NTT-friendly up to
/// transforms of size 2^16.
pub const DEFAULT_PLAIN_MODULUS: u64 = 65537;

/// Default bin-hash salt. A fixed salt keeps bin indices stable across runs;
/// deployments that must prevent cross-session bin-index correlation pass a
/// per-session salt instead.
pub const DEFAULT_HASH_SALT: u64 = 42;

/// Sentinel filling unoccupied bin slots. Never equal to a real item value:
/// callers keep items below `p - 2`.
pub fn dummy_value(plain_modulus: u64) -> u64 {
    plain_modulus - 1
}

/// Sentinel filling the non-queried slots of a query ciphertext; distinct
/// from [`dummy_value`] so a padded query slot never matches a padded bin
/// slot.
pub fn query_filler(plain_modulus: u64) -> u64 {
    plain_modulus - 2
}

/// Core PSI protocol parameters shared by sender and receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsiParams {
    /// Exponents the receiver supplies directly (the powers DAG's source
    /// set), typically `1..=k` for some small k.
    pub pos: Vec<u32>,

    /// Number of field elements per item; constant across a run.
    pub item_len: u32,

    /// Declared per-bin capacity; also the degree bound of each database
    /// chunk's membership polynomial.
    pub max_bin: u32,

    /// Paterson-Stockmeyer low-degree window bound; 0 selects plain linear
    /// evaluation.
    pub ps_low_degree: u32,
}

impl PsiParams {
    /// Parameters where the receiver sends every power `1..=max_bin`
    /// directly, so no homomorphic power derivation is needed.
    pub fn all_source_powers(item_len: u32, max_bin: u32) -> Self {
        Self {
            pos: (1..=max_bin).collect(),
            item_len,
            max_bin,
            ps_low_degree: 0,
        }
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> Result<()> {
        if self.item_len == 0 {
            return Err(Error::config("item_len must be positive"));
        }
        if self.max_bin == 0 {
            return Err(Error::config("max_bin must be positive"));
        }
        if self.pos.is_empty() {
            return Err(Error::config("source power set must be non-empty"));
        }
        if self.pos.iter().any(|&e| e == 0 || e > self.max_bin) {
            return Err(Error::config(format!(
                "source powers must lie in 1..={}",
                self.max_bin
            )));
        }
        if self.ps_low_degree >= self.max_bin {
            return Err(Error::config(
                "ps_low_degree must be smaller than max_bin",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_source_powers_valid() {
        let params = PsiParams::all_source_powers(5, 55);
        assert!(params.validate().is_ok());
        assert_eq!(params.pos.len(), 55);
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let mut params = PsiParams::all_source_powers(1, 8);
        params.item_len = 0;
        assert!(params.validate().is_err());

        let mut params = PsiParams::all_source_powers(1, 8);
        params.pos = vec![0];
        assert!(params.validate().is_err());

        let mut params = PsiParams::all_source_powers(1, 8);
        params.pos = vec![9];
        assert!(params.validate().is_err());

        let mut params = PsiParams::all_source_powers(1, 8);
        params.ps_low_degree = 8;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_sentinels_are_distinct() {
        let p = DEFAULT_PLAIN_MODULUS;
        assert_ne!(dummy_value(p), query_filler(p));
        assert!(dummy_value(p) < p);
    }
}
