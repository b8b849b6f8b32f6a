// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The aggregated range proof type and the service exposing the prover, batch verifier and recovery engine.

use curve25519_dalek::{ristretto::CompressedRistretto, scalar::Scalar};
use serde::{Deserialize, Serialize};

/// Number of bits proven per committed value; values are `u64`s.
pub const INPUT_VALUE_BITS: usize = 64;
/// Maximum number of value commitments covered by one aggregated proof.
pub const MAX_INPUT_VALUES: usize = 16;
/// Maximum embedded message length in bytes.
///
/// The first 23 bytes are packed into the high bits of the `alpha` blinding scalar above the
/// 64-bit value window; the remaining bytes (at most 31, so the packed integer stays canonical in the scalar
/// field) are packed into `tau1`.
pub const MAX_MESSAGE_SIZE: usize = 54;
/// Bytes of message carried alongside the first value in `alpha`.
pub(crate) const MESSAGE_1_MAX_BYTES: usize = 23;
/// Retry budget for zero challenges during proof construction. Zero challenges have cryptographically negligible
/// probability; the bound exists so that construction provably terminates.
pub(crate) const MAX_PROVE_ATTEMPTS: usize = 100;

/// Number of inner-product rounds for an aggregated proof over `num_values` values: the value count is rounded up
/// to a power of two and each value contributes [`INPUT_VALUE_BITS`] bits.
pub(crate) fn rounds_for_values(num_values: usize) -> usize {
    (num_values.next_power_of_two() * INPUT_VALUE_BITS).trailing_zeros() as usize
}

/// An aggregated Bulletproof range proof with an embedded message channel.
///
/// Group elements are stored compressed; verification decompresses them and fails closed on any invalid encoding.
/// A proof is created once, serialized into the surrounding transaction, and thereafter immutable: the verifier
/// and the recovery engine only read it.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    /// Pedersen commitments to the proven values
    pub Vs: Vec<CompressedRistretto>,
    /// Commitment to the bit vectors `aL`, `aR`
    pub A: CompressedRistretto,
    /// Commitment to the blinding vectors `sL`, `sR`
    pub S: CompressedRistretto,
    /// Commitment to the `t1` coefficient of `t(X)`
    pub T_1: CompressedRistretto,
    /// Commitment to the `t2` coefficient of `t(X)`
    pub T_2: CompressedRistretto,
    /// Blinding factor of the `t(x)` evaluation
    pub tau_x: Scalar,
    /// Combined blinding factor of `A` and `S`
    pub mu: Scalar,
    /// The claimed evaluation `t(x) = <l(x), r(x)>`
    pub t_hat: Scalar,
    /// Left inner-product round commitments, one per folding round
    pub Ls: Vec<CompressedRistretto>,
    /// Right inner-product round commitments, one per folding round
    pub Rs: Vec<CompressedRistretto>,
    /// Final folded left scalar
    pub a: Scalar,
    /// Final folded right scalar
    pub b: Scalar,
}

impl RangeProof {
    /// The number of inner-product rounds this proof must carry given its own value-commitment count.
    pub fn expected_rounds(&self) -> usize {
        rounds_for_values(self.Vs.len())
    }
}

/// The confidential-transaction range proof service.
///
/// All three operations are synchronous and run to completion on the calling thread; the only cross-call shared
/// state is the generator cache in [`crate::generators::GeneratorFactory`], so unrelated proofs may be handled
/// concurrently from multiple threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeProofService;

impl RangeProofService {
    /// Create a new range proof service.
    pub fn new() -> Self {
        RangeProofService
    }
}

#[cfg(test)]
mod test {
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use rand::thread_rng;

    use super::*;
    use crate::generators::TokenId;

    #[test]
    fn rounds_follow_the_padded_value_count() {
        assert_eq!(rounds_for_values(1), 6);
        assert_eq!(rounds_for_values(2), 7);
        assert_eq!(rounds_for_values(3), 8);
        assert_eq!(rounds_for_values(4), 8);
        assert_eq!(rounds_for_values(16), 10);
    }

    #[test]
    fn proof_serde_round_trip() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let nonce = RISTRETTO_BASEPOINT_POINT * Scalar::from(12u64);
        let proof = service
            .prove(&mut rng, &[1234], &nonce, b"serde", &TokenId::default())
            .unwrap();
        let bytes = bincode::serialize(&proof).unwrap();
        let decoded: RangeProof = bincode::deserialize(&bytes).unwrap();
        assert_eq!(proof, decoded);
    }
}
