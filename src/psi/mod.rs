//! The PSI protocol: binning, power scheduling, polynomial evaluation, and
//! the sender/receiver message flow.

pub mod binning;
pub mod database;
pub mod evaluate;
pub mod powers;
pub mod query;
pub mod respond;

pub use binning::{build_bin_table, hash_item, BinTable};
pub use database::{build_cipher_db, build_plain_db, Chunk, Database};
pub use evaluate::{eval_linear_cipher, eval_linear_plain, eval_ps, make_random_mask};
pub use powers::{compute_all_powers, PowersDag, PowersNode};
pub use query::{construct_query, find_intersection, MatchLocation, Query};
pub use respond::{aggregate_responses, answer_query_cipher, answer_query_plain};
