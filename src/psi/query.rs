//! Receiver side: query construction and intersection extraction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::modular::mod_pow;
use crate::params::{query_filler, PsiParams};
use crate::psi::binning::hash_item;
use crate::ring::HeRing;

/// Receiver's encrypted request: one ciphertext per supplied exponent, each
/// carrying the item's power at the hashed bin position and the non-matching
/// filler everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query<C> {
    /// `powers[i]` encrypts `item^pos[i]` in the query's bin slots.
    pub powers: Vec<C>,
    /// The exponents, aligned with `powers`; exactly the source set handed
    /// to the powers DAG.
    pub pos: Vec<u32>,
}

/// Location of a matched item in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLocation {
    /// Index of the response chunk that matched.
    pub chunk: usize,
    /// Bin index within the chunk.
    pub bin: usize,
}

impl MatchLocation {
    /// First plaintext slot of the matched bin.
    pub fn slot_offset(&self, item_len: u32) -> usize {
        self.bin * item_len as usize
    }
}

/// Builds the encrypted query for one item.
///
/// Computes `item[j]^e mod p` for every exponent `e` in `params.pos`, places
/// the powers at the item's hashed bin slots (the same layout the binner
/// uses), fills every other slot with the sentinel `p - 2`, and packs and
/// encrypts one ciphertext per exponent.
pub fn construct_query<R: HeRing>(
    ring: &R,
    params: &PsiParams,
    item: &[u64],
    salt: u64,
) -> Result<Query<R::Ciphertext>> {
    params.validate()?;
    let item_len = params.item_len as usize;
    if item.len() != item_len {
        return Err(Error::config(format!(
            "query item has {} elements, expected {}",
            item.len(),
            item_len
        )));
    }
    let ring_dim = ring.ring_dim();
    if ring_dim % item_len != 0 {
        return Err(Error::config(format!(
            "item length {} must divide ring dimension {}",
            item_len, ring_dim
        )));
    }
    let p = ring.plain_modulus();
    let num_bins = ring_dim / item_len;
    let base = (hash_item(item, salt) % num_bins as u64) as usize * item_len;

    let powers = params
        .pos
        .iter()
        .map(|&e| {
            let mut slots = vec![query_filler(p); ring_dim];
            for (j, &elem) in item.iter().enumerate() {
                slots[base + j] = mod_pow(elem, e as u64, p);
            }
            ring.encrypt(&ring.pack(&slots)?)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Query {
        powers,
        pos: params.pos.clone(),
    })
}

/// Scans a decrypted slot vector for a run of `item_len` zeros aligned to a
/// bin boundary, the only pattern a true match can produce.
fn find_zero_bin(slots: &[u64], item_len: usize) -> Option<usize> {
    slots
        .chunks_exact(item_len)
        .position(|bin| bin.iter().all(|&v| v == 0))
}

/// Decrypts each response chunk and returns the first matched location, or
/// `None` when no bin of any chunk decrypts to all zeros.
pub fn find_intersection<R: HeRing>(
    ring: &R,
    params: &PsiParams,
    responses: &[R::Ciphertext],
) -> Result<Option<MatchLocation>> {
    let item_len = params.item_len as usize;
    for (chunk, ct) in responses.iter().enumerate() {
        let slots = ring.unpack(&ring.decrypt(ct)?)?;
        if let Some(bin) = find_zero_bin(&slots, item_len) {
            return Ok(Some(MatchLocation { chunk, bin }));
        }
    }
    Ok(None)
}
