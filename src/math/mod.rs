//! Mathematical primitives for the PSI engine.
//!
//! - **Modular arithmetic** over the plaintext field Z_p
//! - **Number-Theoretic Transform (NTT)** for fast polynomial multiplication
//! - **Vanishing-polynomial interpolation** (divide-and-conquer and naive)
//!
//! All sender-side polynomial work (building per-bin membership polynomials)
//! is plaintext arithmetic in Z_p; the homomorphic ring only ever sees the
//! finished coefficient sequences.

pub mod modular;
pub mod ntt;
pub mod poly;

pub use modular::{mod_inverse, mod_pow};
pub use ntt::NttContext;
pub use poly::{poly_eval, poly_mul_textbook, vanishing_poly, vanishing_poly_naive};
