//! hePSI: homomorphic-encryption private set intersection engine
//!
//! A sender holds a database of items; a receiver learns which of its own
//! items the database contains and nothing else. The protocol:
//!
//! - Items are hashed into fixed-capacity bins; each bin becomes a vanishing
//!   (membership) polynomial whose roots are the bin's items.
//! - The receiver sends encrypted powers of its item; a powers DAG derives
//!   the remaining powers homomorphically with minimal multiplicative depth.
//! - The sender evaluates every bin's polynomial at the query (linearly or
//!   with Paterson-Stockmeyer), masks the results, and responds; a zero slot
//!   after decryption means membership.
//! - Multi-sender responses aggregate by slot-wise product, giving union
//!   membership across senders.
//!
//! Homomorphic operations go through the [`ring::HeRing`] trait;
//! [`backend::ClearBackend`] is an unencrypted reference backend that tracks
//! multiplicative depth honestly.

pub mod backend;
pub mod error;
pub mod math;
pub mod params;
pub mod psi;
pub mod ring;

pub use backend::{ClearBackend, ClearCiphertext};
pub use error::{Error, Result};
pub use params::{
    dummy_value, query_filler, PsiParams, DEFAULT_HASH_SALT, DEFAULT_PLAIN_MODULUS,
};
pub use psi::{
    aggregate_responses, answer_query_cipher, answer_query_plain, build_bin_table,
    build_cipher_db, build_plain_db, compute_all_powers, construct_query, find_intersection,
    BinTable, Database, MatchLocation, PowersDag, Query,
};
pub use ring::HeRing;
