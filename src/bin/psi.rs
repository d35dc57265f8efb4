//! psi: end-to-end private set intersection demo over the clear backend.
//!
//! Generates one random item set per sender, builds each sender's membership
//! database, runs a receiver query through the full protocol (query
//! construction, response evaluation, multi-sender aggregation, intersection
//! extraction), and reports timings.

use std::time::Instant;

use clap::Parser;
use eyre::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hepsi::math::NttContext;
use hepsi::psi::Database;
use hepsi::{
    aggregate_responses, answer_query_cipher, answer_query_plain, build_bin_table,
    build_cipher_db, build_plain_db, construct_query, dummy_value, find_intersection,
    ClearBackend, PsiParams, DEFAULT_HASH_SALT, DEFAULT_PLAIN_MODULUS,
};

#[derive(Parser)]
#[command(name = "psi")]
#[command(about = "Private set intersection demo (clear reference backend)")]
#[command(version)]
struct Args {
    /// Number of senders holding independent item sets
    #[arg(long, default_value = "2")]
    num_parties: usize,

    /// Items per sender
    #[arg(long, default_value = "100")]
    num_items: usize,

    /// Encrypt the database coefficients as well as the query
    #[arg(long)]
    encrypted: bool,

    /// Single-element items (plain PSI) instead of 5-element labeled items
    #[arg(long)]
    psi: bool,

    /// Number of hash bins
    #[arg(long, default_value = "512")]
    num_bins: usize,

    /// Per-bin capacity (degree bound of the membership polynomials)
    #[arg(long, default_value = "20")]
    max_bin: u32,

    /// Random seed for item generation and response masking
    #[arg(long, default_value = "1")]
    seed: u64,
}

fn random_items(rng: &mut ChaCha20Rng, count: usize, item_len: u32, p: u64) -> Vec<Vec<u64>> {
    (0..count)
        .map(|_| (0..item_len).map(|_| rng.gen_range(1..p - 2)).collect())
        .collect()
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let p = DEFAULT_PLAIN_MODULUS;
    let item_len = if args.psi { 1 } else { 5 };
    let ring_dim = args.num_bins * item_len as usize;

    info!("hePSI demo");
    info!("Parties: {}, items per party: {}", args.num_parties, args.num_items);
    info!(
        "Bins: {}, max bin: {}, item length: {}, encrypted database: {}",
        args.num_bins, args.max_bin, item_len, args.encrypted
    );

    if args.num_parties == 0 {
        return Err(eyre::eyre!("need at least one party"));
    }

    let ring = ClearBackend::new(ring_dim, p, 16);
    let ctx = NttContext::new(1 << 12, p).map_err(|e| eyre::eyre!("NTT setup failed: {}", e))?;
    let pool = rayon::ThreadPoolBuilder::new().build()?;
    let mut rng = ChaCha20Rng::seed_from_u64(args.seed);

    let party_items: Vec<Vec<Vec<u64>>> = (0..args.num_parties)
        .map(|_| random_items(&mut rng, args.num_items, item_len, p))
        .collect();

    // Every power 1..=max_bin ships with the query, so no homomorphic power
    // derivation is needed and all parties see the same source set.
    let params = PsiParams::all_source_powers(item_len, args.max_bin);

    let setup_start = Instant::now();
    let tables = party_items
        .iter()
        .map(|items| build_bin_table(items, ring_dim, args.max_bin, dummy_value(p), DEFAULT_HASH_SALT))
        .collect::<hepsi::Result<Vec<_>>>()?;

    enum Db {
        Plain(Database<Vec<u64>>),
        Cipher(Database<hepsi::ClearCiphertext>),
    }
    let dbs = tables
        .iter()
        .map(|table| {
            if args.encrypted {
                Ok(Db::Cipher(build_cipher_db(&ring, &ctx, table, args.max_bin, &pool)?))
            } else {
                Ok(Db::Plain(build_plain_db(&ring, &ctx, table, args.max_bin, &pool)?))
            }
        })
        .collect::<hepsi::Result<Vec<_>>>()?;
    info!("Database setup: {:.2?}", setup_start.elapsed());

    // Query an item known to party 0 and one known to nobody.
    let member = party_items[0][0].clone();
    let non_member = vec![p - 3; item_len as usize];

    for (label, item) in [("member", &member), ("non-member", &non_member)] {
        let query_start = Instant::now();
        let query = construct_query(&ring, &params, item, DEFAULT_HASH_SALT)?;
        info!("Query construction ({}): {:.2?}", label, query_start.elapsed());

        let respond_start = Instant::now();
        let responses = dbs
            .iter()
            .map(|db| match db {
                Db::Plain(db) => {
                    answer_query_plain(&ring, db, &query, &params, 2, &mut rng, &pool)
                }
                Db::Cipher(db) => answer_query_cipher(&ring, db, &query, 2, &mut rng, &pool),
            })
            .collect::<hepsi::Result<Vec<_>>>()?;
        info!("Response evaluation: {:.2?}", respond_start.elapsed());

        let final_response = if responses.len() > 1 {
            let agg_start = Instant::now();
            let agg = aggregate_responses(&ring, &responses, 1, &pool)?;
            info!("Aggregation: {:.2?}", agg_start.elapsed());
            agg
        } else {
            responses.into_iter().next().unwrap_or_default()
        };

        match find_intersection(&ring, &params, &final_response)? {
            Some(loc) => info!(
                "{} query: MATCH in chunk {} bin {}",
                label, loc.chunk, loc.bin
            ),
            None => info!("{} query: no match", label),
        }
    }

    Ok(())
}
