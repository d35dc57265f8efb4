//! Modular arithmetic over the plaintext field Z_p.

/// Modular exponentiation `a^n mod p` by square-and-multiply.
///
/// O(log n) field multiplications; u128 intermediates so any `p < 2^63` is safe.
#[inline]
pub fn mod_pow(a: u64, mut n: u64, p: u64) -> u64 {
    let mut ret: u64 = 1;
    let mut curr = a % p;
    while n > 0 {
        if n & 1 == 1 {
            ret = ((ret as u128 * curr as u128) % p as u128) as u64;
        }
        curr = ((curr as u128 * curr as u128) % p as u128) as u64;
        n >>= 1;
    }
    ret
}

/// Modular inverse `a^(-1) mod p` via the extended Euclidean algorithm.
///
/// Requires `gcd(a, p) = 1`; the result lies in `[0, p)`.
pub fn mod_inverse(a: u64, p: u64) -> u64 {
    if p == 1 {
        return 0;
    }
    let m0 = p as i128;
    let mut a = (a % p) as i128;
    let mut m = p as i128;
    let mut x0: i128 = 0;
    let mut x1: i128 = 1;

    while a > 1 {
        let q = a / m;
        let t = m;
        m = a % m;
        a = t;
        let t = x0;
        x0 = x1 - q * x0;
        x1 = t;
    }

    if x1 < 0 {
        x1 += m0;
    }
    x1 as u64
}

/// Add two values modulo p.
#[inline]
pub fn mod_add(a: u64, b: u64, p: u64) -> u64 {
    let sum = a as u128 + b as u128;
    (sum % p as u128) as u64
}

/// Subtract two values modulo p.
#[inline]
pub fn mod_sub(a: u64, b: u64, p: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        p - (b - a)
    }
}

/// Multiply two values modulo p.
#[inline]
pub fn mod_mul(a: u64, b: u64, p: u64) -> u64 {
    let prod = a as u128 * b as u128;
    (prod % p as u128) as u64
}

/// Negate a value modulo p.
#[inline]
pub fn mod_neg(a: u64, p: u64) -> u64 {
    if a == 0 {
        0
    } else {
        p - a % p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u64 = 65537;

    #[test]
    fn test_mod_pow() {
        assert_eq!(mod_pow(2, 10, P), 1024);
        assert_eq!(mod_pow(3, 0, P), 1);
        assert_eq!(mod_pow(0, 5, P), 0);
        // Fermat: a^(p-1) = 1 mod p
        assert_eq!(mod_pow(12345, P - 1, P), 1);
    }

    #[test]
    fn test_mod_inverse() {
        for a in [1u64, 2, 3, 42, 65535, 65536] {
            let inv = mod_inverse(a, P);
            assert!(inv < P);
            assert_eq!(mod_mul(a, inv, P), 1, "inverse of {} failed", a);
        }
    }

    #[test]
    fn test_mod_sub_wraps() {
        assert_eq!(mod_sub(3, 10, P), P - 7);
        assert_eq!(mod_sub(10, 3, P), 7);
    }

    #[test]
    fn test_mod_neg() {
        assert_eq!(mod_neg(0, P), 0);
        assert_eq!(mod_neg(5, P), P - 5);
    }
}
