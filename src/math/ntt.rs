//! Number-Theoretic Transform (NTT) for fast polynomial multiplication.
//!
//! Implements the Cooley-Tukey radix-2 transform over Z_p for cyclic
//! convolution, enabling O(n log n) polynomial multiplication instead of the
//! O(n²) textbook method. Unlike a negacyclic RLWE transform, this one works
//! on plain coefficient sequences: products are zero-padded to the next power
//! of two, transformed, multiplied pointwise, inverted, and trimmed.
//!
//! # Requirements
//!
//! The modulus p must satisfy p ≡ 1 (mod n) for a primitive n-th root of
//! unity to exist at the maximum transform size n. The default plaintext
//! modulus 65537 supports transforms up to 2^16.

use crate::error::{Error, Result};
use crate::math::modular::{mod_inverse, mod_mul, mod_pow};

/// Precomputed NTT context with per-level twiddle roots.
///
/// Stores, for every transform level `i`, a root of order `2^i` (and its
/// inverse), built by repeated squaring from a primitive `max_size`-th root.
/// Create once and reuse for all multiplications up to `max_size`.
#[derive(Clone, Debug)]
pub struct NttContext {
    prime: u64,
    max_size: usize,
    /// `roots[i]` has multiplicative order `2^i`; index 0 is unused.
    roots: Vec<u64>,
    inv_roots: Vec<u64>,
}

impl NttContext {
    /// Creates an NTT context for transforms up to `max_size` modulo `prime`.
    ///
    /// Finds a primitive `max_size`-th root of unity and precomputes the
    /// per-level root tables.
    ///
    /// # Errors
    ///
    /// `Error::Config` if `max_size` is not a power of two, or if no
    /// primitive root of that order exists (`max_size` does not divide
    /// `prime - 1`).
    pub fn new(max_size: usize, prime: u64) -> Result<Self> {
        if !max_size.is_power_of_two() || max_size < 2 {
            return Err(Error::config(format!(
                "transform size {} must be a power of two >= 2",
                max_size
            )));
        }
        if (prime - 1) % max_size as u64 != 0 {
            return Err(Error::config(format!(
                "no order-{} root of unity exists mod {}",
                max_size, prime
            )));
        }

        let root = find_primitive_root(max_size as u64, prime)?;
        let log_n = max_size.trailing_zeros() as usize;

        let mut roots = vec![0u64; log_n + 1];
        let mut inv_roots = vec![0u64; log_n + 1];
        let mut cur = root;
        let mut cur_inv = mod_inverse(root, prime);
        for i in (1..=log_n).rev() {
            roots[i] = cur;
            inv_roots[i] = cur_inv;
            cur = mod_mul(cur, cur, prime);
            cur_inv = mod_mul(cur_inv, cur_inv, prime);
        }

        Ok(Self {
            prime,
            max_size,
            roots,
            inv_roots,
        })
    }

    /// Returns the modulus p.
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Returns the largest supported transform size.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Forward NTT in place.
    ///
    /// # Panics
    ///
    /// Panics if `a.len()` is not a power of two or exceeds `max_size`.
    pub fn forward(&self, a: &mut [u64]) {
        self.transform(a, false);
    }

    /// Inverse NTT in place; scales every entry by `n^(-1) mod p`.
    ///
    /// # Panics
    ///
    /// Panics if `a.len()` is not a power of two or exceeds `max_size`.
    pub fn inverse(&self, a: &mut [u64]) {
        self.transform(a, true);
    }

    fn transform(&self, a: &mut [u64], invert: bool) {
        let n = a.len();
        assert!(
            n.is_power_of_two() && n <= self.max_size,
            "transform length {} must be a power of two <= {}",
            n,
            self.max_size
        );
        let p = self.prime;
        bit_reverse(a);

        let mut len = 2;
        while len <= n {
            let level = len.trailing_zeros() as usize;
            let wlen = if invert {
                self.inv_roots[level]
            } else {
                self.roots[level]
            };
            let half = len / 2;
            let mut i = 0;
            while i < n {
                let mut w: u64 = 1;
                for j in 0..half {
                    let u = a[i + j];
                    let v = mod_mul(a[i + j + half], w, p);
                    a[i + j] = if u + v >= p { u + v - p } else { u + v };
                    a[i + j + half] = if u >= v { u - v } else { p - v + u };
                    w = mod_mul(w, wlen, p);
                }
                i += len;
            }
            len <<= 1;
        }

        if invert {
            let n_inv = mod_inverse(n as u64, p);
            for x in a.iter_mut() {
                *x = mod_mul(*x, n_inv, p);
            }
        }
    }

    /// Multiplies two coefficient sequences via the NTT.
    ///
    /// Zero-pads both operands to the next power of two covering the product
    /// degree, transforms, multiplies pointwise, inverts, and trims to the
    /// exact result length `a.len() + b.len() - 1`.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the padded size exceeds the context's maximum
    /// transform size.
    pub fn poly_mul(&self, a: &[u64], b: &[u64]) -> Result<Vec<u64>> {
        let out_len = a.len() + b.len() - 1;
        let mut n = 1usize;
        while n < out_len {
            n <<= 1;
        }
        if n > self.max_size {
            return Err(Error::config(format!(
                "product needs transform size {} but context supports {}",
                n, self.max_size
            )));
        }

        let mut fa = a.to_vec();
        let mut fb = b.to_vec();
        fa.resize(n, 0);
        fb.resize(n, 0);

        self.forward(&mut fa);
        self.forward(&mut fb);

        for i in 0..n {
            fa[i] = mod_mul(fa[i], fb[i], self.prime);
        }

        self.inverse(&mut fa);
        fa.truncate(out_len);
        Ok(fa)
    }
}

/// In-place bit-reversal permutation.
fn bit_reverse(a: &mut [u64]) {
    let n = a.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            a.swap(i, j);
        }
    }
}

/// Find an element of exact multiplicative order `n` modulo `p`.
fn find_primitive_root(n: u64, p: u64) -> Result<u64> {
    let exp = (p - 1) / n;
    for g in 2..p {
        let candidate = mod_pow(g, exp, p);
        if mod_pow(candidate, n, p) == 1 && mod_pow(candidate, n / 2, p) != 1 {
            return Ok(candidate);
        }
    }
    Err(Error::config(format!(
        "no primitive order-{} root found mod {}",
        n, p
    )))
}
