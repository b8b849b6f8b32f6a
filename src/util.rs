// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Scalar vector and byte-window helpers shared by the prover, verifier and recovery engine

use curve25519_dalek::scalar::Scalar;

use crate::range_proof::INPUT_VALUE_BITS;

/// Compute the inner product `<a, b>` of two equal-length scalar vectors.
pub(crate) fn inner_product(a: &[Scalar], b: &[Scalar]) -> Scalar {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a, b)| a * b).sum()
}

/// The first `n` powers of `x`: `[1, x, x^2, .., x^(n-1)]`.
pub(crate) fn scalar_powers(x: &Scalar, n: usize) -> Vec<Scalar> {
    let mut powers = Vec::with_capacity(n);
    let mut next = Scalar::ONE;
    for _ in 0..n {
        powers.push(next);
        next *= x;
    }
    powers
}

/// Binary decomposition of a value, least significant bit first, as scalars in `{0, 1}`.
pub(crate) fn value_bits(v: u64) -> Vec<Scalar> {
    (0..INPUT_VALUE_BITS)
        .map(|bit| {
            if (v >> bit) & 1 == 1 {
                Scalar::ONE
            } else {
                Scalar::ZERO
            }
        })
        .collect()
}

/// `2^64` as a scalar; the width of the value window packed into the low bits of `alpha`.
pub(crate) fn two_pow_64() -> Scalar {
    Scalar::from(1u128 << 64)
}

/// Interpret up to 31 big-endian bytes as a scalar. Inputs of this size are below `2^248` and therefore always
/// canonical in the field.
pub(crate) fn scalar_from_be_bytes(bytes: &[u8]) -> Scalar {
    debug_assert!(bytes.len() <= 31);
    let mut le = [0u8; 32];
    for (i, byte) in bytes.iter().rev().enumerate() {
        le[i] = *byte;
    }
    Scalar::from_bytes_mod_order(le)
}

/// The big-endian byte serialization of a scalar with leading zero bytes removed. The zero scalar yields an empty
/// vector.
pub(crate) fn trimmed_be_bytes(s: &Scalar) -> Vec<u8> {
    s.to_bytes().iter().rev().copied().skip_while(|b| *b == 0).collect()
}

/// Drop the low 64 bits of a scalar's canonical representation.
pub(crate) fn shift_right_64(s: &Scalar) -> Scalar {
    let bytes = s.to_bytes();
    let mut le = [0u8; 32];
    le[..24].copy_from_slice(&bytes[8..]);
    Scalar::from_bytes_mod_order(le)
}

/// The low 64 bits of a scalar's canonical representation.
pub(crate) fn low_u64(s: &Scalar) -> u64 {
    let bytes = s.to_bytes();
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inner_product_small() {
        let a = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        let b = vec![Scalar::from(4u64), Scalar::from(5u64), Scalar::from(6u64)];
        assert_eq!(inner_product(&a, &b), Scalar::from(32u64));
    }

    #[test]
    fn scalar_powers_start_at_one() {
        let x = Scalar::from(3u64);
        let powers = scalar_powers(&x, 4);
        assert_eq!(powers, vec![
            Scalar::ONE,
            Scalar::from(3u64),
            Scalar::from(9u64),
            Scalar::from(27u64)
        ]);
    }

    #[test]
    fn bits_round_trip() {
        for v in [0u64, 1, 2, 100, u64::MAX] {
            let bits = value_bits(v);
            assert_eq!(bits.len(), INPUT_VALUE_BITS);
            let recombined: Scalar = bits
                .iter()
                .enumerate()
                .map(|(i, bit)| bit * Scalar::from(1u64 << i))
                .sum();
            assert_eq!(recombined, Scalar::from(v));
        }
    }

    #[test]
    fn be_bytes_round_trip() {
        let message = b"hello world";
        let s = scalar_from_be_bytes(message);
        assert_eq!(trimmed_be_bytes(&s), message.to_vec());
        assert!(trimmed_be_bytes(&Scalar::ZERO).is_empty());
    }

    #[test]
    fn value_window_extraction() {
        // message bytes in the high bits, value in the low 64 bits
        let msg = scalar_from_be_bytes(b"abc");
        let packed = msg * two_pow_64() + Scalar::from(12345u64);
        assert_eq!(low_u64(&packed), 12345);
        assert_eq!(shift_right_64(&packed), msg);
        // the full 64-bit window must survive the mask
        let packed = msg * two_pow_64() + Scalar::from(u64::MAX);
        assert_eq!(low_u64(&packed), u64::MAX);
        assert_eq!(shift_right_64(&packed), msg);
    }
}
