//! Reference ring backend over clear (unencrypted) slot vectors.
//!
//! Implements [`HeRing`] with plain modular arithmetic so the engine can be
//! exercised end to end without a lattice scheme: "ciphertexts" are slot
//! vectors mod p plus a consumed-depth counter. The counter honestly models
//! the one contract a real HE backend enforces, a bounded number of
//! ciphertext×ciphertext multiplications, so depth-budget violations fail
//! here the same way they would fail in production.
//!
//! Used by the unit tests, the integration tests, and the demo binary.

use crate::error::{Error, Result};
use crate::ring::HeRing;

/// A clear "ciphertext": packed slots plus accumulated multiplicative depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearCiphertext {
    slots: Vec<u64>,
    depth: u32,
}

impl ClearCiphertext {
    /// Multiplicative depth this value has accumulated.
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// Unencrypted reference backend with a multiplicative-depth budget.
#[derive(Clone, Debug)]
pub struct ClearBackend {
    ring_dim: usize,
    prime: u64,
    depth_budget: u32,
}

impl ClearBackend {
    /// Create a backend with `ring_dim` slots modulo `prime`, allowing at
    /// most `depth_budget` sequential ciphertext multiplications.
    pub fn new(ring_dim: usize, prime: u64, depth_budget: u32) -> Self {
        Self {
            ring_dim,
            prime,
            depth_budget,
        }
    }

    fn check_depth(&self, depth: u32) -> Result<u32> {
        if depth > self.depth_budget {
            return Err(Error::backend(format!(
                "insufficient multiplicative depth: need {}, budget {}",
                depth, self.depth_budget
            )));
        }
        Ok(depth)
    }

    fn check_dim(&self, ct: &ClearCiphertext) -> Result<()> {
        if ct.slots.len() != self.ring_dim {
            return Err(Error::backend(format!(
                "ciphertext has {} slots, ring dimension is {}",
                ct.slots.len(),
                self.ring_dim
            )));
        }
        Ok(())
    }

    fn zip_slots<F>(&self, a: &[u64], b: &[u64], f: F) -> Vec<u64>
    where
        F: Fn(u64, u64) -> u64,
    {
        a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect()
    }
}

impl HeRing for ClearBackend {
    type Plaintext = Vec<u64>;
    type Ciphertext = ClearCiphertext;

    fn ring_dim(&self) -> usize {
        self.ring_dim
    }

    fn plain_modulus(&self) -> u64 {
        self.prime
    }

    fn pack(&self, values: &[u64]) -> Result<Self::Plaintext> {
        if values.len() > self.ring_dim {
            return Err(Error::backend(format!(
                "cannot pack {} values into {} slots",
                values.len(),
                self.ring_dim
            )));
        }
        let mut slots: Vec<u64> = values.iter().map(|&v| v % self.prime).collect();
        slots.resize(self.ring_dim, 0);
        Ok(slots)
    }

    fn unpack(&self, pt: &Self::Plaintext) -> Result<Vec<u64>> {
        Ok(pt.clone())
    }

    fn encrypt(&self, pt: &Self::Plaintext) -> Result<Self::Ciphertext> {
        Ok(ClearCiphertext {
            slots: pt.clone(),
            depth: 0,
        })
    }

    fn decrypt(&self, ct: &Self::Ciphertext) -> Result<Self::Plaintext> {
        self.check_dim(ct)?;
        Ok(ct.slots.clone())
    }

    fn add(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        self.check_dim(b)?;
        Ok(ClearCiphertext {
            slots: self.zip_slots(&a.slots, &b.slots, |x, y| (x + y) % self.prime),
            depth: a.depth.max(b.depth),
        })
    }

    fn add_plain(&self, a: &Self::Ciphertext, b: &Self::Plaintext) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        Ok(ClearCiphertext {
            slots: self.zip_slots(&a.slots, b, |x, y| (x + y) % self.prime),
            depth: a.depth,
        })
    }

    fn sub(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        self.check_dim(b)?;
        let p = self.prime;
        Ok(ClearCiphertext {
            slots: self.zip_slots(&a.slots, &b.slots, |x, y| (x + p - y) % p),
            depth: a.depth.max(b.depth),
        })
    }

    fn mult(&self, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        self.check_dim(b)?;
        let p = self.prime;
        let depth = self.check_depth(a.depth.max(b.depth) + 1)?;
        Ok(ClearCiphertext {
            slots: self.zip_slots(&a.slots, &b.slots, |x, y| {
                ((x as u128 * y as u128) % p as u128) as u64
            }),
            depth,
        })
    }

    fn mult_plain(&self, a: &Self::Ciphertext, b: &Self::Plaintext) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        let p = self.prime;
        // Plaintext multiplication adds noise but no relinearization level.
        Ok(ClearCiphertext {
            slots: self.zip_slots(&a.slots, b, |x, y| {
                ((x as u128 * y as u128) % p as u128) as u64
            }),
            depth: a.depth,
        })
    }

    fn square(&self, a: &Self::Ciphertext) -> Result<Self::Ciphertext> {
        self.mult(a, a)
    }

    fn rotate(&self, a: &Self::Ciphertext, shift: i32) -> Result<Self::Ciphertext> {
        self.check_dim(a)?;
        let n = self.ring_dim as i64;
        let k = ((shift as i64 % n) + n) % n;
        let mut slots = a.slots.clone();
        slots.rotate_left(k as usize);
        Ok(ClearCiphertext {
            slots,
            depth: a.depth,
        })
    }

    fn add_many(&self, cts: &[Self::Ciphertext]) -> Result<Self::Ciphertext> {
        let (first, rest) = cts
            .split_first()
            .ok_or_else(|| Error::backend("add_many over an empty ciphertext list"))?;
        let mut acc = first.clone();
        for ct in rest {
            acc = self.add(&acc, ct)?;
        }
        Ok(acc)
    }

    fn mult_many(&self, cts: &[Self::Ciphertext]) -> Result<Self::Ciphertext> {
        // Balanced pairwise tree, so depth grows as ceil(log2(n)) like the
        // backend schemes' n-ary multiply.
        match cts.len() {
            0 => Err(Error::backend("mult_many over an empty ciphertext list")),
            1 => Ok(cts[0].clone()),
            _ => {
                let mut layer = cts.to_vec();
                while layer.len() > 1 {
                    let mut next = Vec::with_capacity(layer.len().div_ceil(2));
                    for pair in layer.chunks(2) {
                        if pair.len() == 2 {
                            next.push(self.mult(&pair[0], &pair[1])?);
                        } else {
                            next.push(pair[0].clone());
                        }
                    }
                    layer = next;
                }
                Ok(layer.pop().expect("non-empty layer"))
            }
        }
    }

    fn compress(&self, ct: &Self::Ciphertext, _target_level: u32) -> Result<Self::Ciphertext> {
        // Level truncation only affects ciphertext size in a real scheme;
        // the slot contents are unchanged.
        self.check_dim(ct)?;
        Ok(ct.clone())
    }
}
