//! Sender side: answering encrypted queries and aggregating multi-sender
//! responses.
//!
//! The responder derives every power of the query the database polynomials
//! need (via the powers DAG), evaluates each chunk's packed polynomial at
//! those powers, multiplies the result by a fresh random mask so only the
//! zero/non-zero membership pattern survives decryption, and compresses each
//! response ciphertext before it goes back on the wire.

use std::collections::BTreeSet;

use rand::Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::PsiParams;
use crate::psi::database::Database;
use crate::psi::evaluate::{eval_linear_cipher, eval_linear_plain, eval_ps, make_random_mask};
use crate::psi::powers::{compute_all_powers, PowersDag};
use crate::psi::query::Query;
use crate::ring::HeRing;

/// Derives `query.powers` into the full run `x^1 .. x^poly_deg`.
fn expand_powers<R: HeRing>(
    ring: &R,
    query: &Query<R::Ciphertext>,
    poly_deg: u32,
) -> Result<Vec<R::Ciphertext>> {
    if query.powers.len() != query.pos.len() {
        return Err(Error::config(format!(
            "query carries {} ciphertexts for {} exponents",
            query.powers.len(),
            query.pos.len()
        )));
    }
    let sources: BTreeSet<u32> = query.pos.iter().copied().collect();
    let targets: BTreeSet<u32> = (1..=poly_deg).collect();
    let dag = PowersDag::configure(&sources, &targets)?;
    debug!(depth = dag.depth(), max_exponent = dag.max_exponent(), "powers DAG configured");

    let mut powers: Vec<Option<R::Ciphertext>> = vec![None; dag.max_exponent() as usize];
    for (i, &e) in query.pos.iter().enumerate() {
        powers[e as usize - 1] = Some(query.powers[i].clone());
    }
    compute_all_powers(ring, &dag, &mut powers)?;

    powers
        .into_iter()
        .take(poly_deg as usize)
        .enumerate()
        .map(|(i, p)| {
            p.ok_or_else(|| Error::config(format!("power {} was not derived", i + 1)))
        })
        .collect()
}

fn check_chunks<T>(db: &Database<T>) -> Result<()> {
    for (i, chunk) in db.chunks.iter().enumerate() {
        if chunk.payload.len() != chunk.poly_deg as usize + 1 {
            return Err(Error::config(format!(
                "chunk {} holds {} coefficients for degree {}",
                i,
                chunk.payload.len(),
                chunk.poly_deg
            )));
        }
    }
    Ok(())
}

/// Answers a query against a plaintext-encoded database.
///
/// Each chunk's polynomial is evaluated with the Paterson-Stockmeyer strategy
/// when `params.ps_low_degree > 0` and linearly otherwise, masked with a
/// fresh random plaintext, and compressed to `rem_depth` levels. Chunks are
/// evaluated in parallel on the caller's pool; masks are drawn up front so
/// the pass stays deterministic for a seeded `rng`.
pub fn answer_query_plain<R: HeRing>(
    ring: &R,
    db: &Database<R::Plaintext>,
    query: &Query<R::Ciphertext>,
    params: &PsiParams,
    rem_depth: u32,
    rng: &mut impl Rng,
    pool: &ThreadPool,
) -> Result<Vec<R::Ciphertext>> {
    check_chunks(db)?;
    let powers = expand_powers(ring, query, db.poly_deg)?;

    let masks = (0..db.num_chunks())
        .map(|_| make_random_mask(ring, rng))
        .collect::<Result<Vec<_>>>()?;

    pool.install(|| {
        db.chunks
            .par_iter()
            .zip(masks.par_iter())
            .map(|(chunk, mask)| {
                let eval = if params.ps_low_degree > 0 {
                    eval_ps(ring, &chunk.payload, &powers, params.ps_low_degree)?
                } else {
                    eval_linear_plain(ring, &chunk.payload, &powers)?
                };
                let masked = ring.mult_plain(&eval, mask)?;
                ring.compress(&masked, rem_depth)
            })
            .collect()
    })
}

/// Answers a query against a ciphertext-encoded database.
///
/// Coefficients are ciphertexts here, so every chunk uses the linear strategy
/// regardless of `ps_low_degree`; masking and compression are as in
/// [`answer_query_plain`].
pub fn answer_query_cipher<R: HeRing>(
    ring: &R,
    db: &Database<R::Ciphertext>,
    query: &Query<R::Ciphertext>,
    rem_depth: u32,
    rng: &mut impl Rng,
    pool: &ThreadPool,
) -> Result<Vec<R::Ciphertext>> {
    check_chunks(db)?;
    let powers = expand_powers(ring, query, db.poly_deg)?;

    let masks = (0..db.num_chunks())
        .map(|_| make_random_mask(ring, rng))
        .collect::<Result<Vec<_>>>()?;

    pool.install(|| {
        db.chunks
            .par_iter()
            .zip(masks.par_iter())
            .map(|(chunk, mask)| {
                let eval = eval_linear_cipher(ring, &chunk.payload, &powers)?;
                let masked = ring.mult_plain(&eval, mask)?;
                ring.compress(&masked, rem_depth)
            })
            .collect()
    })
}

/// Combines the per-sender responses of a multi-sender run into one response.
///
/// Chunk `i` of the result is the product of chunk `i` across all senders: a
/// bin slot decrypts to zero exactly when at least one sender's polynomial
/// vanished there, so the product implements set-union membership.
pub fn aggregate_responses<R: HeRing>(
    ring: &R,
    responses: &[Vec<R::Ciphertext>],
    rem_depth: u32,
    pool: &ThreadPool,
) -> Result<Vec<R::Ciphertext>> {
    let num_chunks = responses
        .first()
        .map(Vec::len)
        .ok_or_else(|| Error::config("no responses to aggregate"))?;
    if responses.iter().any(|r| r.len() != num_chunks) {
        return Err(Error::config(
            "responses disagree on the number of chunks",
        ));
    }

    pool.install(|| {
        (0..num_chunks)
            .into_par_iter()
            .map(|i| {
                let column: Vec<R::Ciphertext> =
                    responses.iter().map(|r| r[i].clone()).collect();
                let product = ring.mult_many(&column)?;
                ring.compress(&product, rem_depth)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClearBackend;
    use crate::math::ntt::NttContext;
    use crate::params::{dummy_value, DEFAULT_HASH_SALT, DEFAULT_PLAIN_MODULUS};
    use crate::psi::binning::{build_bin_table, hash_item};
    use crate::psi::database::{build_cipher_db, build_plain_db};
    use crate::psi::query::{construct_query, find_intersection};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const P: u64 = DEFAULT_PLAIN_MODULUS;
    const DIM: usize = 8;
    const MAX_BIN: u32 = 8;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn setup(
        items: &[Vec<u64>],
        ring: &ClearBackend,
        pool: &ThreadPool,
    ) -> (Database<Vec<u64>>, PsiParams) {
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let table =
            build_bin_table(items, DIM, MAX_BIN, dummy_value(P), DEFAULT_HASH_SALT).unwrap();
        let db = build_plain_db(ring, &ctx, &table, table.max_load, pool).unwrap();
        (db, PsiParams::all_source_powers(1, table.max_load))
    }

    #[test]
    fn test_member_matches_and_non_member_does_not() {
        let ring = ClearBackend::new(DIM, P, 8);
        let pool = pool();
        let items: Vec<Vec<u64>> = vec![vec![5], vec![12], vec![42], vec![100]];
        let (db, params) = setup(&items, &ring, &pool);
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        let q = construct_query(&ring, &params, &[42], DEFAULT_HASH_SALT).unwrap();
        let response =
            answer_query_plain(&ring, &db, &q, &params, 1, &mut rng, &pool).unwrap();
        let hit = find_intersection(&ring, &params, &response).unwrap();
        let expected_bin = (hash_item(&[42], DEFAULT_HASH_SALT) % DIM as u64) as usize;
        assert_eq!(hit.map(|m| m.bin), Some(expected_bin));

        let q = construct_query(&ring, &params, &[7], DEFAULT_HASH_SALT).unwrap();
        let response =
            answer_query_plain(&ring, &db, &q, &params, 1, &mut rng, &pool).unwrap();
        assert!(find_intersection(&ring, &params, &response).unwrap().is_none());
    }

    #[test]
    fn test_ps_strategy_agrees_with_linear() {
        let ring = ClearBackend::new(DIM, P, 16);
        let pool = pool();
        let items: Vec<Vec<u64>> = (0..24u64).map(|i| vec![3 * i + 5]).collect();
        let (db, linear_params) = setup(&items, &ring, &pool);
        assert!(db.poly_deg >= 3, "need degree for a PS window");

        let mut ps_params = linear_params.clone();
        ps_params.ps_low_degree = 2;

        let member = vec![3 * 10 + 5];
        let q = construct_query(&ring, &linear_params, &member, DEFAULT_HASH_SALT).unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let lin =
            answer_query_plain(&ring, &db, &q, &linear_params, 1, &mut rng, &pool).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let ps = answer_query_plain(&ring, &db, &q, &ps_params, 1, &mut rng, &pool).unwrap();

        // Same seed, same masks: the zero pattern (and in the clear backend
        // the full slot values) must agree.
        for (a, b) in lin.iter().zip(ps.iter()) {
            assert_eq!(ring.decrypt(a).unwrap(), ring.decrypt(b).unwrap());
        }
        assert!(find_intersection(&ring, &linear_params, &ps).unwrap().is_some());
    }

    #[test]
    fn test_cipher_db_response_matches_membership() {
        let ring = ClearBackend::new(DIM, P, 16);
        let pool = pool();
        let ctx = NttContext::new(1 << 8, P).unwrap();
        let items: Vec<Vec<u64>> = vec![vec![9], vec![21], vec![33]];
        let table =
            build_bin_table(&items, DIM, MAX_BIN, dummy_value(P), DEFAULT_HASH_SALT).unwrap();
        let db = build_cipher_db(&ring, &ctx, &table, table.max_load, &pool).unwrap();
        let params = PsiParams::all_source_powers(1, table.max_load);
        let mut rng = ChaCha20Rng::seed_from_u64(13);

        let q = construct_query(&ring, &params, &[21], DEFAULT_HASH_SALT).unwrap();
        let response = answer_query_cipher(&ring, &db, &q, 1, &mut rng, &pool).unwrap();
        assert!(find_intersection(&ring, &params, &response).unwrap().is_some());

        let q = construct_query(&ring, &params, &[22], DEFAULT_HASH_SALT).unwrap();
        let response = answer_query_cipher(&ring, &db, &q, 1, &mut rng, &pool).unwrap();
        assert!(find_intersection(&ring, &params, &response).unwrap().is_none());
    }

    #[test]
    fn test_aggregation_implements_union_membership() {
        let ring = ClearBackend::new(DIM, P, 16);
        let pool = pool();
        let sender_a: Vec<Vec<u64>> = vec![vec![5], vec![12]];
        let sender_b: Vec<Vec<u64>> = vec![vec![42], vec![100]];
        let (db_a, params) = setup(&sender_a, &ring, &pool);
        let (db_b, params_b) = setup(&sender_b, &ring, &pool);
        // Both senders must expose the same degree for a shared query.
        assert_eq!(params.pos, params_b.pos);
        let mut rng = ChaCha20Rng::seed_from_u64(17);

        // 42 belongs to sender B only; the aggregate must still match.
        let q = construct_query(&ring, &params, &[42], DEFAULT_HASH_SALT).unwrap();
        let ra = answer_query_plain(&ring, &db_a, &q, &params, 2, &mut rng, &pool).unwrap();
        let rb = answer_query_plain(&ring, &db_b, &q, &params, 2, &mut rng, &pool).unwrap();
        let agg = aggregate_responses(&ring, &[ra, rb], 1, &pool).unwrap();
        assert!(find_intersection(&ring, &params, &agg).unwrap().is_some());

        // 7 belongs to neither.
        let q = construct_query(&ring, &params, &[7], DEFAULT_HASH_SALT).unwrap();
        let ra = answer_query_plain(&ring, &db_a, &q, &params, 2, &mut rng, &pool).unwrap();
        let rb = answer_query_plain(&ring, &db_b, &q, &params, 2, &mut rng, &pool).unwrap();
        let agg = aggregate_responses(&ring, &[ra, rb], 1, &pool).unwrap();
        assert!(find_intersection(&ring, &params, &agg).unwrap().is_none());
    }

    #[test]
    fn test_mismatched_chunk_counts_rejected() {
        let ring = ClearBackend::new(DIM, P, 8);
        let pool = pool();
        let ct = ring.encrypt(&ring.pack(&vec![1; DIM]).unwrap()).unwrap();
        let err = aggregate_responses(&ring, &[vec![ct.clone()], vec![ct.clone(), ct]], 1, &pool)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(aggregate_responses::<ClearBackend>(&ring, &[], 1, &pool).is_err());
    }
}
