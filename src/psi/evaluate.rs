//! Homomorphic polynomial evaluation strategies.
//!
//! Both strategies evaluate `Σ cᵢ·xⁱ` given the precomputed powers
//! `x¹..x^d`:
//!
//! - **Linear**: one coefficient multiplication per power, a single n-ary
//!   sum, constant term last. Depth = 1 beyond the input powers.
//! - **Paterson-Stockmeyer**: windows of `ps_low_degree + 1` coefficients
//!   combine the low powers, then one "giant step" multiplication per window.
//!   Fewer distinct powers (O(√d)) at the cost of extra additions.
//!
//! The responder multiplies every evaluation by a fresh uniformly random mask
//! (see [`make_random_mask`]) before it leaves the sender, so a non-member
//! bin decrypts to random noise rather than a predictable value; only the
//! zero/non-zero membership bit per position survives.

use rand::Rng;

use crate::error::{Error, Result};
use crate::ring::HeRing;

fn check_degree(coeff_count: usize, power_count: usize) -> Result<()> {
    if coeff_count != power_count + 1 {
        return Err(Error::config(format!(
            "degree mismatch: {} coefficients vs {} powers",
            coeff_count,
            power_count + 1
        )));
    }
    Ok(())
}

fn accumulate<R: HeRing>(
    ring: &R,
    acc: &mut Option<R::Ciphertext>,
    value: R::Ciphertext,
) -> Result<()> {
    *acc = Some(match acc.take() {
        Some(prev) => ring.add(&prev, &value)?,
        None => value,
    });
    Ok(())
}

/// Direct linear-combination evaluation with plaintext coefficients.
///
/// `coeffs[i]` weights `powers[i-1] = x^i`; `coeffs[0]` is added last.
pub fn eval_linear_plain<R: HeRing>(
    ring: &R,
    coeffs: &[R::Plaintext],
    powers: &[R::Ciphertext],
) -> Result<R::Ciphertext> {
    check_degree(coeffs.len(), powers.len())?;

    let mut terms = Vec::with_capacity(powers.len());
    for (i, power) in powers.iter().enumerate() {
        terms.push(ring.mult_plain(power, &coeffs[i + 1])?);
    }
    let sum = ring.add_many(&terms)?;
    ring.add_plain(&sum, &coeffs[0])
}

/// Direct linear-combination evaluation with ciphertext coefficients
/// (encrypted-database mode). Identical structure to
/// [`eval_linear_plain`], but every coefficient multiplication is
/// ciphertext×ciphertext.
pub fn eval_linear_cipher<R: HeRing>(
    ring: &R,
    coeffs: &[R::Ciphertext],
    powers: &[R::Ciphertext],
) -> Result<R::Ciphertext> {
    check_degree(coeffs.len(), powers.len())?;

    let mut terms = Vec::with_capacity(powers.len());
    for (i, power) in powers.iter().enumerate() {
        terms.push(ring.mult(power, &coeffs[i + 1])?);
    }
    let sum = ring.add_many(&terms)?;
    ring.add(&sum, &coeffs[0])
}

/// Paterson-Stockmeyer evaluation with plaintext coefficients.
///
/// Window size is `h = ps_low_degree + 1`. Four phases: the inner linear
/// combinations of full windows times their giant-step power, the residual
/// partial window, the leading degree-`< h` terms, and the coefficients
/// sitting exactly at the giant steps; the constant term closes the sum.
///
/// # Errors
///
/// `Error::Config` on coefficient/power count mismatch, or when
/// `ps_low_degree` is 0 or not smaller than the degree (callers use the
/// linear strategy there).
pub fn eval_ps<R: HeRing>(
    ring: &R,
    coeffs: &[R::Plaintext],
    powers: &[R::Ciphertext],
    ps_low_degree: u32,
) -> Result<R::Ciphertext> {
    check_degree(coeffs.len(), powers.len())?;
    let degree = coeffs.len() - 1;
    if ps_low_degree == 0 || ps_low_degree as usize >= degree {
        return Err(Error::config(format!(
            "ps_low_degree {} is invalid for degree {}",
            ps_low_degree, degree
        )));
    }

    let h = ps_low_degree as usize + 1;
    let full_windows = degree / h;

    let mut res: Option<R::Ciphertext> = None;

    // Full windows past the first: inner combination of the low powers, then
    // one giant-step multiplication.
    for i in 1..full_windows {
        let mut inner: Option<R::Ciphertext> = None;
        for j in 1..h {
            let term = ring.mult_plain(&powers[j - 1], &coeffs[i * h + j])?;
            accumulate(ring, &mut inner, term)?;
        }
        if let Some(inner) = inner {
            let stepped = ring.mult(&inner, &powers[i * h - 1])?;
            accumulate(ring, &mut res, stepped)?;
        }
    }

    // Residual partial window when the degree is not a multiple of h.
    let rem = degree % h;
    if rem > 0 && full_windows > 0 {
        let mut inner: Option<R::Ciphertext> = None;
        for j in 1..=rem {
            let term = ring.mult_plain(&powers[j - 1], &coeffs[full_windows * h + j])?;
            accumulate(ring, &mut inner, term)?;
        }
        if let Some(inner) = inner {
            let stepped = ring.mult(&inner, &powers[full_windows * h - 1])?;
            accumulate(ring, &mut res, stepped)?;
        }
    }

    // Leading low-degree terms (the first window).
    for j in 1..h {
        let term = ring.mult_plain(&powers[j - 1], &coeffs[j])?;
        accumulate(ring, &mut res, term)?;
    }

    // Coefficients at the giant steps themselves.
    for i in 1..=full_windows {
        let term = ring.mult_plain(&powers[i * h - 1], &coeffs[i * h])?;
        accumulate(ring, &mut res, term)?;
    }

    let res = res.ok_or_else(|| Error::config("polynomial has no non-constant terms"))?;
    ring.add_plain(&res, &coeffs[0])
}

/// Packs `ring_dim` values uniform over `[1, p - 1]` as a multiplicative
/// mask. Zero is excluded so masking never destroys the membership bit.
pub fn make_random_mask<R: HeRing>(ring: &R, rng: &mut impl Rng) -> Result<R::Plaintext> {
    let p = ring.plain_modulus();
    let values: Vec<u64> = (0..ring.ring_dim()).map(|_| rng.gen_range(1..p)).collect();
    ring.pack(&values)
}
