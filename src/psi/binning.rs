//! Bin hashing: distributing items into fixed-capacity bins.
//!
//! A single salted SHA-256 hash assigns every item to one bin; collisions are
//! absorbed by bin capacity (no cuckoo displacement). An item of `item_len`
//! field elements occupies `item_len` consecutive table rows, one element per
//! row, so a bin's rows line up with `item_len` consecutive plaintext slots
//! after packing.

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};

/// Item-to-bin assignment produced by [`build_bin_table`]. Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct BinTable {
    /// One row per plaintext slot; `rows[r][s]` is slot `s` of row `r`.
    /// Unoccupied slots hold the dummy sentinel.
    pub rows: Vec<Vec<u64>>,
    /// Field elements per item.
    pub item_len: u32,
    /// Maximum occupancy observed over all rows; every row is trimmed to
    /// exactly this length.
    pub max_load: u32,
}

impl BinTable {
    /// Number of bins (row groups of `item_len`).
    pub fn num_bins(&self) -> usize {
        self.rows.len() / self.item_len as usize
    }
}

/// Salted 64-bit item hash: SHA-256 over `salt || item`, truncated to the
/// first 8 little-endian bytes.
pub fn hash_item(item: &[u64], salt: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(salt.to_le_bytes());
    for &v in item {
        hasher.update(v.to_le_bytes());
    }
    let digest = hasher.finalize();
    u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

/// Hashes `items` into a bin table with `ring_dim / item_len` bins.
///
/// Each item lands at bin `hash_item(item, salt) % num_bins` and is appended
/// at the bin's next free slot. After all insertions every row is trimmed to
/// the observed maximum occupancy, so downstream polynomial degree is not
/// wasted on guaranteed-empty slots.
///
/// # Errors
///
/// `Error::Config` if items are empty or of inconsistent length, or if
/// `item_len` does not divide `ring_dim`; `Error::Capacity` as soon as any
/// bin's occupancy would exceed `max_bin`.
pub fn build_bin_table(
    items: &[Vec<u64>],
    ring_dim: usize,
    max_bin: u32,
    dummy: u64,
    salt: u64,
) -> Result<BinTable> {
    let item_len = items
        .first()
        .map(|it| it.len())
        .ok_or_else(|| Error::config("cannot build a bin table from zero items"))?;
    if item_len == 0 {
        return Err(Error::config("items must have at least one element"));
    }
    if items.iter().any(|it| it.len() != item_len) {
        return Err(Error::config("all items must have the same length"));
    }
    if ring_dim % item_len != 0 {
        return Err(Error::config(format!(
            "item length {} must divide ring dimension {}",
            item_len, ring_dim
        )));
    }

    let num_bins = ring_dim / item_len;
    let mut rows = vec![vec![dummy; max_bin as usize]; ring_dim];
    let mut occupancy = vec![0usize; ring_dim];

    for item in items {
        let bin = (hash_item(item, salt) % num_bins as u64) as usize;
        for (j, &elem) in item.iter().enumerate() {
            let row = bin * item_len + j;
            if occupancy[row] >= max_bin as usize {
                return Err(Error::Capacity {
                    bin,
                    occupancy: occupancy[row] + 1,
                    max_bin: max_bin as usize,
                });
            }
            rows[row][occupancy[row]] = elem;
            occupancy[row] += 1;
        }
    }

    let max_load = occupancy.iter().copied().max().unwrap_or(0) as u32;
    for row in rows.iter_mut() {
        row.truncate(max_load as usize);
    }

    info!(max_load, num_bins, "bin table built");

    Ok(BinTable {
        rows,
        item_len: item_len as u32,
        max_load,
    })
}
