//! Sender database construction: per-bin vanishing polynomials, chunked by
//! degree and slot-packed across bins.
//!
//! Each bin row's items become the roots of a vanishing polynomial. Rows are
//! split into chunks of at most `max_degree` items; within a chunk, slot `k`
//! of packed element `j` holds coefficient `j` of row `k`'s polynomial, so
//! one packed plaintext (or ciphertext) carries the same coefficient index
//! for every bin at once.

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::math::ntt::NttContext;
use crate::math::poly::vanishing_poly;
use crate::psi::binning::BinTable;
use crate::ring::HeRing;

/// One degree-bounded slice of the database: `payload[j]` is coefficient `j`
/// of every bin's polynomial, slot-packed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk<T> {
    pub payload: Vec<T>,
    pub poly_deg: u32,
}

/// Ordered chunks covering the full occupancy range of a bin table. Built
/// once, queried many times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database<T> {
    pub chunks: Vec<Chunk<T>>,
    pub poly_deg: u32,
}

impl<T> Database<T> {
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }
}

/// Interpolates every row of every chunk: `result[chunk][row]` is the padded
/// coefficient sequence (`max_degree + 1` entries) of that row's vanishing
/// polynomial over the chunk's slice of items.
fn interpolate_chunks(
    ctx: &NttContext,
    table: &BinTable,
    max_degree: u32,
    pool: &ThreadPool,
) -> Result<Vec<Vec<Vec<u64>>>> {
    let per_row = table.max_load as usize;
    let max_degree = max_degree as usize;
    let num_chunks = per_row.div_ceil(max_degree);

    (0..num_chunks)
        .map(|i| {
            let start = i * max_degree;
            let end = ((i + 1) * max_degree).min(per_row);
            pool.install(|| {
                table
                    .rows
                    .par_iter()
                    .map(|row| {
                        let mut coeffs = vanishing_poly(ctx, &row[start..end])?;
                        coeffs.resize(max_degree + 1, 0);
                        Ok(coeffs)
                    })
                    .collect::<Result<Vec<_>>>()
            })
        })
        .collect()
}

/// Re-packs one chunk's per-row coefficients coefficient-wise: packed element
/// `j` holds coefficient `j` across all rows.
fn pack_chunk<R: HeRing>(ring: &R, row_coeffs: &[Vec<u64>]) -> Result<Vec<R::Plaintext>> {
    let coeff_count = row_coeffs[0].len();
    (0..coeff_count)
        .map(|j| {
            let slots: Vec<u64> = row_coeffs.iter().map(|coeffs| coeffs[j]).collect();
            ring.pack(&slots)
        })
        .collect()
}

fn check_shape<R: HeRing>(ring: &R, table: &BinTable, max_degree: u32) -> Result<()> {
    if max_degree == 0 {
        return Err(Error::config("max_degree must be positive"));
    }
    if table.rows.len() != ring.ring_dim() {
        return Err(Error::config(format!(
            "bin table has {} rows but the ring has {} slots",
            table.rows.len(),
            ring.ring_dim()
        )));
    }
    Ok(())
}

/// Builds a plaintext-encoded database from a bin table.
pub fn build_plain_db<R: HeRing>(
    ring: &R,
    ctx: &NttContext,
    table: &BinTable,
    max_degree: u32,
    pool: &ThreadPool,
) -> Result<Database<R::Plaintext>> {
    check_shape(ring, table, max_degree)?;

    let chunks = interpolate_chunks(ctx, table, max_degree, pool)?
        .iter()
        .map(|row_coeffs| {
            Ok(Chunk {
                payload: pack_chunk(ring, row_coeffs)?,
                poly_deg: max_degree,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(num_chunks = chunks.len(), max_degree, "plaintext database built");
    Ok(Database {
        chunks,
        poly_deg: max_degree,
    })
}

/// Builds a ciphertext-encoded database: identical to [`build_plain_db`]
/// except every packed coefficient element is encrypted.
pub fn build_cipher_db<R: HeRing>(
    ring: &R,
    ctx: &NttContext,
    table: &BinTable,
    max_degree: u32,
    pool: &ThreadPool,
) -> Result<Database<R::Ciphertext>> {
    check_shape(ring, table, max_degree)?;

    let chunks = interpolate_chunks(ctx, table, max_degree, pool)?
        .iter()
        .map(|row_coeffs| {
            let payload = pack_chunk(ring, row_coeffs)?
                .iter()
                .map(|pt| ring.encrypt(pt))
                .collect::<Result<Vec<_>>>()?;
            Ok(Chunk {
                payload,
                poly_deg: max_degree,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(num_chunks = chunks.len(), max_degree, "ciphertext database built");
    Ok(Database {
        chunks,
        poly_deg: max_degree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClearBackend;
    use crate::math::poly::poly_eval;
    use crate::params::{dummy_value, DEFAULT_HASH_SALT, DEFAULT_PLAIN_MODULUS};
    use crate::psi::binning::{build_bin_table, hash_item};

    const P: u64 = DEFAULT_PLAIN_MODULUS;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn test_chunk_layout_and_count() {
        let ring = ClearBackend::new(16, P, 4);
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let items: Vec<Vec<u64>> = (0..30u64).map(|i| vec![i + 3]).collect();
        let table = build_bin_table(&items, 16, 16, dummy_value(P), DEFAULT_HASH_SALT).unwrap();

        let max_degree = 2u32;
        let db = build_plain_db(&ring, &ctx, &table, max_degree, &pool()).unwrap();

        let expected_chunks = (table.max_load as usize).div_ceil(max_degree as usize);
        assert_eq!(db.num_chunks(), expected_chunks);
        for chunk in &db.chunks {
            assert_eq!(chunk.payload.len(), max_degree as usize + 1);
        }
    }

    #[test]
    fn test_packed_polynomials_vanish_at_members() {
        let ring = ClearBackend::new(8, P, 4);
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let items: Vec<Vec<u64>> = vec![vec![5], vec![12], vec![42], vec![100]];
        let table = build_bin_table(&items, 8, 8, dummy_value(P), DEFAULT_HASH_SALT).unwrap();

        let max_degree = table.max_load;
        let db = build_plain_db(&ring, &ctx, &table, max_degree, &pool()).unwrap();
        assert_eq!(db.num_chunks(), 1);

        // Reassemble each bin's coefficient sequence from the packed chunk
        // and check the vanishing property at that bin's items.
        let chunk = &db.chunks[0];
        let unpacked: Vec<Vec<u64>> = chunk
            .payload
            .iter()
            .map(|pt| ring.unpack(pt).unwrap())
            .collect();

        for item in &items {
            let bin = (hash_item(item, DEFAULT_HASH_SALT) % 8) as usize;
            let coeffs: Vec<u64> = unpacked.iter().map(|slots| slots[bin]).collect();
            assert_eq!(poly_eval(&coeffs, item[0], P), 0, "item {:?}", item);
            assert_ne!(poly_eval(&coeffs, 7, P), 0, "non-member must not vanish");
        }
    }

    #[test]
    fn test_cipher_db_decrypts_to_plain_db() {
        let ring = ClearBackend::new(8, P, 4);
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let items: Vec<Vec<u64>> = (0..6u64).map(|i| vec![10 * i + 3]).collect();
        let table = build_bin_table(&items, 8, 8, dummy_value(P), DEFAULT_HASH_SALT).unwrap();

        let p = pool();
        let plain = build_plain_db(&ring, &ctx, &table, table.max_load, &p).unwrap();
        let cipher = build_cipher_db(&ring, &ctx, &table, table.max_load, &p).unwrap();

        assert_eq!(plain.num_chunks(), cipher.num_chunks());
        for (pc, cc) in plain.chunks.iter().zip(cipher.chunks.iter()) {
            for (pt, ct) in pc.payload.iter().zip(cc.payload.iter()) {
                assert_eq!(pt, &ring.decrypt(ct).unwrap());
            }
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let ring = ClearBackend::new(8, P, 4);
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let items = vec![vec![3u64]];
        // Table built for a different ring dimension.
        let table = build_bin_table(&items, 16, 4, dummy_value(P), DEFAULT_HASH_SALT).unwrap();
        assert!(build_plain_db(&ring, &ctx, &table, 4, &pool()).is_err());
    }
}
