//! Polynomial operations over Z_p: textbook multiplication, Horner
//! evaluation, and vanishing-polynomial interpolation.
//!
//! A vanishing polynomial ∏(x − rᵢ) is the monic polynomial whose roots are
//! exactly a bin's item values; it evaluates to zero precisely at membership.
//! Coefficient sequences are indexed by degree (`coeffs[i]` is the degree-i
//! coefficient).

use crate::error::{Error, Result};
use crate::math::modular::{mod_add, mod_mul, mod_neg};
use crate::math::ntt::NttContext;

/// Textbook O(n·m) polynomial multiplication modulo p.
pub fn poly_mul_textbook(a: &[u64], b: &[u64], p: u64) -> Vec<u64> {
    let mut result = vec![0u64; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            result[i + j] = mod_add(result[i + j], mod_mul(ai, bj, p), p);
        }
    }
    result
}

/// Horner evaluation of a coefficient sequence at `x` modulo p.
pub fn poly_eval(coeffs: &[u64], x: u64, p: u64) -> u64 {
    let mut ret: u64 = 0;
    for &c in coeffs.iter().rev() {
        ret = mod_mul(ret, x, p);
        ret = mod_add(c, ret, p);
    }
    ret
}

/// Builds the vanishing polynomial ∏(x − rᵢ) by divide-and-conquer.
///
/// Splits the root set in half, recurses, and multiplies the halves. The
/// multiplication method is chosen by the combined sub-problem size: once it
/// exceeds half the context's maximum transform size, textbook multiplication
/// keeps the transform within the precomputed root tables; below that, the
/// NTT pays off. Recursion depth is O(log(roots.len())).
pub fn vanishing_poly(ctx: &NttContext, roots: &[u64]) -> Result<Vec<u64>> {
    let p = ctx.prime();
    match roots {
        [] => return Err(Error::config("vanishing polynomial needs at least one root")),
        [r] => return Ok(vec![mod_neg(*r, p), 1]),
        _ => {}
    }

    let mid = roots.len() / 2;
    let left = vanishing_poly(ctx, &roots[..mid])?;
    let right = vanishing_poly(ctx, &roots[mid..])?;

    if roots.len() > ctx.max_size() / 2 {
        Ok(poly_mul_textbook(&left, &right, p))
    } else {
        ctx.poly_mul(&left, &right)
    }
}

/// Naive vanishing-polynomial construction by repeated textbook
/// multiplication against each root.
///
/// O(n²); kept for cross-validation against [`vanishing_poly`] in tests, not
/// used on production paths.
pub fn vanishing_poly_naive(roots: &[u64], p: u64) -> Vec<u64> {
    let mut ret = vec![mod_neg(roots[0], p), 1];
    for &r in &roots[1..] {
        ret = poly_mul_textbook(&ret, &[mod_neg(r, p), 1], p);
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u64 = 65537;

    fn ctx() -> NttContext {
        NttContext::new(1 << 12, P).unwrap()
    }

    #[test]
    fn test_poly_eval_horner() {
        // 3 + 2x + x^2 at x = 5 -> 3 + 10 + 25 = 38
        assert_eq!(poly_eval(&[3, 2, 1], 5, P), 38);
        assert_eq!(poly_eval(&[7], 12345, P), 7);
    }

    #[test]
    fn test_vanishing_poly_single_root() {
        let poly = vanishing_poly(&ctx(), &[5]).unwrap();
        assert_eq!(poly, vec![P - 5, 1]);
        assert_eq!(poly_eval(&poly, 5, P), 0);
    }

    #[test]
    fn test_vanishing_poly_roots_vanish() {
        let roots: Vec<u64> = (1..=16u64).collect();
        let poly = vanishing_poly(&ctx(), &roots).unwrap();
        assert_eq!(poly.len(), roots.len() + 1);
        assert_eq!(*poly.last().unwrap(), 1, "must be monic");
        for &r in &roots {
            assert_eq!(poly_eval(&poly, r, P), 0, "root {} must vanish", r);
        }
        // A non-root must not vanish
        assert_ne!(poly_eval(&poly, 42, P), 0);
    }

    #[test]
    fn test_fast_matches_naive() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(11);
        let c = ctx();
        for len in [1usize, 2, 3, 7, 33, 100] {
            let roots: Vec<u64> = (0..len).map(|_| rng.gen_range(1..P)).collect();
            let fast = vanishing_poly(&c, &roots).unwrap();
            let naive = vanishing_poly_naive(&roots, P);
            assert_eq!(fast, naive, "mismatch at {} roots", len);
        }
    }

    #[test]
    fn test_textbook_fallback_above_half_context() {
        // Context of size 8: any sub-problem over 4 roots combines via the
        // textbook path; results must still agree with the naive build.
        let small = NttContext::new(8, P).unwrap();
        let roots: Vec<u64> = (1..=10u64).collect();
        let fast = vanishing_poly(&small, &roots).unwrap();
        assert_eq!(fast, vanishing_poly_naive(&roots, P));
    }
}
