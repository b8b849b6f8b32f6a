// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Batch verification.
//!
//! Every proof in a batch is checked by replaying its transcript to re-derive the challenges, then folding its
//! two verification equations, weighted by fresh random scalars, into one shared multi-exponentiation. The batch
//! accepts only if the combined sum is the group identity. Any malformed shape, invalid point encoding or zero
//! challenge fails closed as `false`; verification has no error surface.

use std::iter;

use curve25519_dalek::{ristretto::CompressedRistretto, ristretto::RistrettoPoint, scalar::Scalar,
                       traits::IsIdentity, traits::VartimeMultiscalarMul};
use log::{debug, error};
use rand_core::{CryptoRng, RngCore};

use crate::{
    generators::{GeneratorFactory, TokenId},
    range_proof::{RangeProof, RangeProofService, INPUT_VALUE_BITS, MAX_INPUT_VALUES},
    transcript::{new_range_proof_transcript, TranscriptProtocol},
    util::scalar_powers,
};

const LOG_TARGET: &str = "tari_range_proofs::verifier";

/// The challenges re-derived from a proof's public fields, plus the dimensions they imply. Call-local: built
/// fresh per verification or recovery and discarded afterwards.
pub(crate) struct ReplayedChallenges {
    pub y: Scalar,
    pub z: Scalar,
    pub x: Scalar,
    pub x_ip: Scalar,
    pub ws: Vec<Scalar>,
    pub inv_ws: Vec<Scalar>,
    pub num_rounds: usize,
    pub m: usize,
    pub mn: usize,
}

/// Replay a proof's transcript and return its challenges, or `None` if any challenge replays to zero.
pub(crate) fn replay_challenges(proof: &RangeProof) -> Option<ReplayedChallenges> {
    let mut transcript = new_range_proof_transcript();
    for v in &proof.Vs {
        transcript.append_point(b"V", v);
    }
    transcript.append_point(b"A", &proof.A);
    transcript.append_point(b"S", &proof.S);
    let y = transcript.challenge_scalar(b"y");
    if y == Scalar::ZERO {
        return None;
    }
    transcript.append_scalar(b"y", &y);
    let z = transcript.challenge_scalar(b"z");
    if z == Scalar::ZERO {
        return None;
    }
    transcript.append_scalar(b"z", &z);
    transcript.append_point(b"T1", &proof.T_1);
    transcript.append_point(b"T2", &proof.T_2);
    let x = transcript.challenge_scalar(b"x");
    if x == Scalar::ZERO {
        return None;
    }
    transcript.append_scalar(b"x", &x);
    transcript.append_scalar(b"tau_x", &proof.tau_x);
    transcript.append_scalar(b"mu", &proof.mu);
    transcript.append_scalar(b"t_hat", &proof.t_hat);
    let x_ip = transcript.challenge_scalar(b"x_ip");
    if x_ip == Scalar::ZERO {
        return None;
    }

    let mut ws = Vec::with_capacity(proof.Ls.len());
    for (l, r) in proof.Ls.iter().zip(proof.Rs.iter()) {
        transcript.append_point(b"L", l);
        transcript.append_point(b"R", r);
        let w = transcript.challenge_scalar(b"w");
        if w == Scalar::ZERO {
            return None;
        }
        ws.push(w);
    }
    let inv_ws: Vec<Scalar> = ws.iter().map(Scalar::invert).collect();

    let m = proof.Vs.len().next_power_of_two();
    Some(ReplayedChallenges {
        y,
        z,
        x,
        x_ip,
        num_rounds: ws.len(),
        ws,
        inv_ws,
        m,
        mn: m * INPUT_VALUE_BITS,
    })
}

/// Build the folded-challenge lookup table for undoing the inner-product folding.
///
/// Entry `i` is the product over all rounds of `ws[j]` where bit `rounds - 1 - j` of `i` is set and `inv_ws[j]`
/// where it is clear, so round 0 corresponds to the most significant index bit. Entry `i` is then the coefficient
/// the folding assigns to `Gi[i]`; the bit-complemented entry is the coefficient for the `Hi` side.
pub(crate) fn challenge_product_cache(ws: &[Scalar], inv_ws: &[Scalar]) -> Vec<Scalar> {
    let rounds = ws.len();
    let mut cache = vec![Scalar::ONE; 1 << rounds];
    cache[0] = inv_ws[0];
    cache[1] = ws[0];
    for j in 1..rounds {
        let slots = 1usize << (j + 1);
        // descending, so cache[s / 2] is read before either half overwrites it
        for s in (1..slots).rev().step_by(2) {
            cache[s] = cache[s / 2] * ws[j];
            cache[s - 1] = cache[s / 2] * inv_ws[j];
        }
    }
    cache
}

fn decompress_all(points: &[CompressedRistretto]) -> Option<Vec<RistrettoPoint>> {
    points.iter().map(CompressedRistretto::decompress).collect()
}

impl RangeProofService {
    /// Verify a batch of proofs in one multi-exponentiation. An empty batch is vacuously valid; any shape
    /// violation, invalid encoding or failed aggregate check yields `false` for the whole batch.
    pub fn verify<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        indexed_proofs: &[(usize, RangeProof)],
        token_id: &TokenId,
    ) -> bool {
        if indexed_proofs.is_empty() {
            return true;
        }

        let mut derived = Vec::with_capacity(indexed_proofs.len());
        for (index, proof) in indexed_proofs {
            if proof.Vs.is_empty() || proof.Vs.len() > MAX_INPUT_VALUES {
                debug!(
                    target: LOG_TARGET,
                    "Proof {} has an invalid value-commitment count ({})",
                    index,
                    proof.Vs.len()
                );
                return false;
            }
            if proof.Ls.len() != proof.Rs.len() || proof.Ls.len() != proof.expected_rounds() {
                debug!(
                    target: LOG_TARGET,
                    "Proof {} has mismatched round-commitment counts ({} L, {} R, {} expected)",
                    index,
                    proof.Ls.len(),
                    proof.Rs.len(),
                    proof.expected_rounds()
                );
                return false;
            }
            match replay_challenges(proof) {
                Some(challenges) => derived.push((index, proof, challenges)),
                None => {
                    debug!(target: LOG_TARGET, "Proof {} replayed a zero challenge", index);
                    return false;
                },
            }
        }

        let gens = GeneratorFactory::get_instance(token_id);
        let max_mn = derived.iter().map(|(_, _, c)| c.mn).max().unwrap_or(0);

        let mut g_base_scalar = Scalar::ZERO;
        let mut h_base_scalar = Scalar::ZERO;
        let mut gi_scalars = vec![Scalar::ZERO; max_mn];
        let mut hi_scalars = vec![Scalar::ZERO; max_mn];
        let mut dynamic_scalars: Vec<Scalar> = Vec::new();
        let mut dynamic_points: Vec<RistrettoPoint> = Vec::new();

        for (index, proof, c) in &derived {
            let decompressed = decompress_all(&proof.Vs).and_then(|vs| {
                Some((
                    vs,
                    proof.A.decompress()?,
                    proof.S.decompress()?,
                    proof.T_1.decompress()?,
                    proof.T_2.decompress()?,
                    decompress_all(&proof.Ls)?,
                    decompress_all(&proof.Rs)?,
                ))
            });
            let (vs, a_commit, s_commit, t_1, t_2, ls, rs) = match decompressed {
                Some(points) => points,
                None => {
                    debug!(target: LOG_TARGET, "Proof {} contains an invalid point encoding", index);
                    return false;
                },
            };

            let weight_y = Scalar::random(&mut *rng);
            let weight_z = Scalar::random(&mut *rng);

            let z_powers = scalar_powers(&c.z, c.m + 3);
            let y_inv_powers = scalar_powers(&c.y.invert(), c.mn);
            let y_sum: Scalar = scalar_powers(&c.y, c.mn).iter().sum();
            let w_cache = challenge_product_cache(&c.ws, &c.inv_ws);

            // the value/commitment equation: sum(z^(j+2) V_j) + x T1 + x^2 T2 + (delta - t_hat) G - tau_x H == 0,
            // where delta = (z - z^2) <1, y^mn> - sum_j z^(j+3) <1, 2^64>
            let z_pow_sum: Scalar = (0..c.m).map(|j| z_powers[j + 3]).sum();
            let delta = (c.z - c.z * c.z) * y_sum - Scalar::from(u64::MAX) * z_pow_sum;
            g_base_scalar += weight_y * (delta - proof.t_hat);
            h_base_scalar -= weight_y * proof.tau_x;
            for (j, v) in vs.iter().enumerate() {
                dynamic_scalars.push(z_powers[j + 2] * weight_y);
                dynamic_points.push(*v);
            }
            dynamic_scalars.push(c.x * weight_y);
            dynamic_points.push(t_1);
            dynamic_scalars.push(c.x * c.x * weight_y);
            dynamic_points.push(t_2);

            // the inner-product equation, with the folding undone through the w_cache coefficients
            dynamic_scalars.push(weight_z);
            dynamic_points.push(a_commit);
            dynamic_scalars.push(c.x * weight_z);
            dynamic_points.push(s_commit);
            for i in 0..c.mn {
                let z_two = z_powers[2 + i / INPUT_VALUE_BITS] * Scalar::from(1u64 << (i % INPUT_VALUE_BITS));
                gi_scalars[i] -= (proof.a * w_cache[i] + c.z) * weight_z;
                hi_scalars[i] +=
                    (c.z + (z_two - proof.b * w_cache[(!i) & (c.mn - 1)]) * y_inv_powers[i]) * weight_z;
            }
            h_base_scalar += weight_z * ((proof.t_hat - proof.a * proof.b) * c.x_ip - proof.mu);
            for k in 0..c.num_rounds {
                dynamic_scalars.push(c.ws[k] * c.ws[k] * weight_z);
                dynamic_points.push(ls[k]);
                dynamic_scalars.push(c.inv_ws[k] * c.inv_ws[k] * weight_z);
                dynamic_points.push(rs[k]);
            }
        }

        let aggregate = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(&g_base_scalar)
                .chain(iter::once(&h_base_scalar))
                .chain(gi_scalars.iter())
                .chain(hi_scalars.iter())
                .chain(dynamic_scalars.iter()),
            iter::once(&gens.G)
                .chain(iter::once(&gens.H))
                .chain(gens.Gi[..max_mn].iter())
                .chain(gens.Hi[..max_mn].iter())
                .chain(dynamic_points.iter()),
        );
        if !aggregate.is_identity() {
            error!(target: LOG_TARGET, "Range proof batch failed to verify");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod test {
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use rand::thread_rng;
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::range_proof::MAX_MESSAGE_SIZE;

    fn test_nonce(seed: u64) -> RistrettoPoint {
        RISTRETTO_BASEPOINT_POINT * Scalar::from(seed)
    }

    fn prove(values: &[u64], message: &[u8], seed: u64) -> RangeProof {
        let mut rng = thread_rng();
        RangeProofService::new()
            .prove(&mut rng, values, &test_nonce(seed), message, &TokenId::default())
            .unwrap()
    }

    #[test]
    fn challenge_product_cache_matches_the_direct_product() {
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        for rounds in 1..=3usize {
            let ws: Vec<Scalar> = (0..rounds).map(|_| Scalar::random(&mut rng)).collect();
            let inv_ws: Vec<Scalar> = ws.iter().map(Scalar::invert).collect();
            let cache = challenge_product_cache(&ws, &inv_ws);
            assert_eq!(cache.len(), 1 << rounds);
            for (i, entry) in cache.iter().enumerate() {
                let mut expected = Scalar::ONE;
                for j in 0..rounds {
                    if (i >> (rounds - 1 - j)) & 1 == 1 {
                        expected *= ws[j];
                    } else {
                        expected *= inv_ws[j];
                    }
                }
                assert_eq!(*entry, expected, "entry {} of {} rounds", i, rounds);
            }
        }
    }

    #[test]
    fn empty_batch_is_vacuously_valid() {
        let mut rng = thread_rng();
        assert!(RangeProofService::new().verify(&mut rng, &[], &TokenId::default()));
    }

    #[test]
    fn single_value_round_trip() {
        let mut rng = thread_rng();
        let proof = prove(&[1234], b"", 1);
        assert!(RangeProofService::new().verify(&mut rng, &[(0, proof)], &TokenId::default()));
    }

    #[test]
    fn aggregated_round_trips() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let cases: &[&[u64]] = &[
            &[0],
            &[0, u64::MAX],
            &[1, 2, 3],
            &[5, 10, 15, 20, 25],
            &[7; 16],
        ];
        for (seed, values) in cases.iter().enumerate() {
            let proof = prove(values, b"attached message", seed as u64 + 10);
            assert!(
                service.verify(&mut rng, &[(0, proof)], &TokenId::default()),
                "{} values failed to verify",
                values.len()
            );
        }
    }

    #[test]
    fn saturated_values_round_trip() {
        // every bit of every value set, so the weighted <1, 2^64> part of delta carries maximal weight
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        for (seed, count) in [1usize, 2, 4, 16].iter().enumerate() {
            let values = vec![u64::MAX; *count];
            let proof = prove(&values, b"", seed as u64 + 300);
            assert!(
                service.verify(&mut rng, &[(0, proof)], &TokenId::default()),
                "{} saturated values failed to verify",
                count
            );
        }
    }

    #[test]
    fn maximum_length_message_round_trip() {
        let mut rng = thread_rng();
        let message = vec![0x5au8; MAX_MESSAGE_SIZE];
        let proof = prove(&[42], &message, 99);
        assert!(RangeProofService::new().verify(&mut rng, &[(0, proof)], &TokenId::default()));
    }

    #[test]
    fn batch_of_valid_proofs_verifies() {
        let mut rng = thread_rng();
        let batch: Vec<(usize, RangeProof)> = (0..4u64)
            .map(|i| (i as usize, prove(&[100 + i, 200 + i], b"batch", 500 + i)))
            .collect();
        assert!(RangeProofService::new().verify(&mut rng, &batch, &TokenId::default()));
    }

    #[test]
    fn tampered_proofs_fail() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let proof = prove(&[100, 200], b"tamper", 7);
        assert!(service.verify(&mut rng, &[(0, proof.clone())], &TokenId::default()));

        let bogus_point = (RISTRETTO_BASEPOINT_POINT * Scalar::from(123_456u64)).compress();
        let tampered: Vec<(&str, RangeProof)> = vec![
            ("a", {
                let mut p = proof.clone();
                p.a += Scalar::ONE;
                p
            }),
            ("b", {
                let mut p = proof.clone();
                p.b += Scalar::ONE;
                p
            }),
            ("tau_x", {
                let mut p = proof.clone();
                p.tau_x += Scalar::ONE;
                p
            }),
            ("mu", {
                let mut p = proof.clone();
                p.mu += Scalar::ONE;
                p
            }),
            ("t_hat", {
                let mut p = proof.clone();
                p.t_hat += Scalar::ONE;
                p
            }),
            ("Vs[0]", {
                let mut p = proof.clone();
                p.Vs[0] = bogus_point;
                p
            }),
            ("Ls[0]", {
                let mut p = proof.clone();
                p.Ls[0] = bogus_point;
                p
            }),
            ("A", {
                let mut p = proof.clone();
                p.A = bogus_point;
                p
            }),
        ];
        for (field, p) in tampered {
            assert!(
                !service.verify(&mut rng, &[(0, p)], &TokenId::default()),
                "tampered {} still verified",
                field
            );
        }
    }

    #[test]
    fn one_bad_proof_fails_the_batch() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let good: Vec<RangeProof> = (0..3u64).map(|i| prove(&[50 + i], b"", 700 + i)).collect();
        let mut bad = prove(&[51], b"", 800);
        bad.mu += Scalar::ONE;

        let mut batch: Vec<(usize, RangeProof)> = good.iter().cloned().enumerate().collect();
        batch.push((batch.len(), bad.clone()));
        assert!(!service.verify(&mut rng, &batch, &TokenId::default()));

        for proof in &good {
            assert!(service.verify(&mut rng, &[(0, proof.clone())], &TokenId::default()));
        }
        assert!(!service.verify(&mut rng, &[(0, bad)], &TokenId::default()));
    }

    #[test]
    fn malformed_shapes_fail_closed() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let proof = prove(&[100], b"", 3);

        let mut no_values = proof.clone();
        no_values.Vs.clear();
        assert!(!service.verify(&mut rng, &[(0, no_values)], &TokenId::default()));

        let mut missing_round = proof.clone();
        missing_round.Ls.pop();
        assert!(!service.verify(&mut rng, &[(0, missing_round)], &TokenId::default()));

        let mut extra_r = proof;
        extra_r.Rs.push(extra_r.Rs[0]);
        assert!(!service.verify(&mut rng, &[(0, extra_r)], &TokenId::default()));
    }

    #[test]
    fn proofs_are_bound_to_their_token() {
        let mut rng = thread_rng();
        let service = RangeProofService::new();
        let token = TokenId::from(77);
        let proof = RangeProofService::new()
            .prove(&mut rng, &[500], &test_nonce(5), b"", &token)
            .unwrap();
        assert!(service.verify(&mut rng, &[(0, proof.clone())], &token));
        assert!(!service.verify(&mut rng, &[(0, proof)], &TokenId::default()));
    }
}
