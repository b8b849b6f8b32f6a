// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Proof construction.
//!
//! All blinding factors except `sL`, `sR` and `tau2` are derived deterministically from the shared secret, which
//! is what makes later amount and message recovery possible. The message rides in two of them: the first
//! 23 bytes are packed into `alpha` above the 64-bit value window, the remainder into `tau1`.

use std::iter;

use curve25519_dalek::{ristretto::CompressedRistretto, ristretto::RistrettoPoint, scalar::Scalar,
                       traits::VartimeMultiscalarMul};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::{
    errors::RangeProofError,
    generators::{GeneratorFactory, TokenId},
    hashing::nonce_scalar,
    inner_product::fold,
    range_proof::{RangeProof, RangeProofService, INPUT_VALUE_BITS, MAX_INPUT_VALUES, MAX_MESSAGE_SIZE,
                  MAX_PROVE_ATTEMPTS, MESSAGE_1_MAX_BYTES},
    transcript::{new_range_proof_transcript, TranscriptProtocol},
    util::{inner_product, scalar_from_be_bytes, scalar_powers, two_pow_64, value_bits},
};

const SALT_ALPHA: u64 = 1;
const SALT_RHO: u64 = 2;
const SALT_TAU1: u64 = 3;
const SALT_TAU2: u64 = 4;
const SALT_GAMMA_BASE: u64 = 100;

/// Drive a fallible attempt to completion within a fixed retry budget.
///
/// `Ok(None)` means the attempt hit a zero challenge and should be retried; `Err` is fatal and propagated
/// immediately. An exhausted budget is a construction error, so this always terminates.
pub(crate) fn run_with_retries<T, F>(max_attempts: usize, mut attempt: F) -> Result<T, RangeProofError>
where F: FnMut() -> Result<Option<T>, RangeProofError> {
    for _ in 0..max_attempts {
        if let Some(outcome) = attempt()? {
            return Ok(outcome);
        }
    }
    Err(RangeProofError::ProofConstruction(format!(
        "retry budget of {} attempts exhausted",
        max_attempts
    )))
}

impl RangeProofService {
    /// Construct an aggregated range proof over `values`, embedding `message` and deriving the deterministic
    /// blinding factors from `nonce`.
    ///
    /// Fails if `values` is empty or holds more than [`MAX_INPUT_VALUES`] entries, or if `message` exceeds
    /// [`MAX_MESSAGE_SIZE`] bytes.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        values: &[u64],
        nonce: &RistrettoPoint,
        message: &[u8],
        token_id: &TokenId,
    ) -> Result<RangeProof, RangeProofError> {
        if values.is_empty() {
            return Err(RangeProofError::InvalidInput("no values to prove".to_string()));
        }
        if values.len() > MAX_INPUT_VALUES {
            return Err(RangeProofError::InvalidInput(format!(
                "{} values exceed the maximum of {}",
                values.len(),
                MAX_INPUT_VALUES
            )));
        }
        if message.len() > MAX_MESSAGE_SIZE {
            return Err(RangeProofError::InvalidInput(format!(
                "message of {} bytes exceeds the maximum of {}",
                message.len(),
                MAX_MESSAGE_SIZE
            )));
        }

        let gens = GeneratorFactory::get_instance(token_id);
        let m = values.len().next_power_of_two();
        let mn = m * INPUT_VALUE_BITS;

        let gammas: Zeroizing<Vec<Scalar>> = Zeroizing::new(
            (0..values.len() as u64)
                .map(|i| nonce_scalar(nonce, SALT_GAMMA_BASE + i))
                .collect(),
        );
        let vs: Vec<CompressedRistretto> = values
            .iter()
            .zip(gammas.iter())
            .map(|(v, gamma)| (gens.G * Scalar::from(*v) + gens.H * gamma).compress())
            .collect();

        let msg1_len = message.len().min(MESSAGE_1_MAX_BYTES);
        let alpha =
            nonce_scalar(nonce, SALT_ALPHA) + scalar_from_be_bytes(&message[..msg1_len]) * two_pow_64() +
                Scalar::from(values[0]);
        let rho = nonce_scalar(nonce, SALT_RHO);
        let tau1 = nonce_scalar(nonce, SALT_TAU1) + scalar_from_be_bytes(&message[msg1_len..]);
        let tau2 = nonce_scalar(nonce, SALT_TAU2);

        // padding slots beyond the supplied values are logically zero
        let mut a_l: Vec<Scalar> = Vec::with_capacity(mn);
        for v in values {
            a_l.extend(value_bits(*v));
        }
        a_l.resize(mn, Scalar::ZERO);
        let a_r: Vec<Scalar> = a_l.iter().map(|bit| bit - Scalar::ONE).collect();

        let a_commit = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(&alpha).chain(a_l.iter()).chain(a_r.iter()),
            iter::once(&gens.H)
                .chain(gens.Gi[..mn].iter())
                .chain(gens.Hi[..mn].iter()),
        )
        .compress();

        // the transcript carries over between attempts; a retried attempt re-appends its commitments to the
        // advanced state and thereby draws fresh challenges
        let mut transcript = new_range_proof_transcript();
        for v in &vs {
            transcript.append_point(b"V", v);
        }

        run_with_retries(MAX_PROVE_ATTEMPTS, || {
            transcript.append_point(b"A", &a_commit);

            let s_l: Zeroizing<Vec<Scalar>> =
                Zeroizing::new((0..mn).map(|_| Scalar::random(&mut *rng)).collect());
            let s_r: Zeroizing<Vec<Scalar>> =
                Zeroizing::new((0..mn).map(|_| Scalar::random(&mut *rng)).collect());
            let s_commit = RistrettoPoint::vartime_multiscalar_mul(
                iter::once(&rho).chain(s_l.iter()).chain(s_r.iter()),
                iter::once(&gens.H)
                    .chain(gens.Gi[..mn].iter())
                    .chain(gens.Hi[..mn].iter()),
            )
            .compress();
            transcript.append_point(b"S", &s_commit);

            let y = transcript.challenge_scalar(b"y");
            if y == Scalar::ZERO {
                return Ok(None);
            }
            transcript.append_scalar(b"y", &y);
            let z = transcript.challenge_scalar(b"z");
            if z == Scalar::ZERO {
                return Ok(None);
            }
            transcript.append_scalar(b"z", &z);

            let z_powers = scalar_powers(&z, m + 3);
            let y_powers = scalar_powers(&y, mn);

            let l_0: Zeroizing<Vec<Scalar>> = Zeroizing::new(a_l.iter().map(|bit| bit - z).collect());
            let l_1 = s_l;
            let r_0: Zeroizing<Vec<Scalar>> = Zeroizing::new(
                (0..mn)
                    .map(|i| {
                        let z_two = z_powers[2 + i / INPUT_VALUE_BITS] *
                            Scalar::from(1u64 << (i % INPUT_VALUE_BITS));
                        y_powers[i] * (a_r[i] + z) + z_two
                    })
                    .collect(),
            );
            let r_1: Zeroizing<Vec<Scalar>> =
                Zeroizing::new(y_powers.iter().zip(s_r.iter()).map(|(y_i, s)| y_i * s).collect());

            let t_1 = inner_product(&l_0, &r_1) + inner_product(&l_1, &r_0);
            let t_2 = inner_product(&l_1, &r_1);

            let cap_t_1 = (gens.G * t_1 + gens.H * tau1).compress();
            let cap_t_2 = (gens.G * t_2 + gens.H * tau2).compress();
            transcript.append_point(b"T1", &cap_t_1);
            transcript.append_point(b"T2", &cap_t_2);
            let x = transcript.challenge_scalar(b"x");
            if x == Scalar::ZERO {
                return Ok(None);
            }

            let l: Vec<Scalar> = l_0.iter().zip(l_1.iter()).map(|(l0, l1)| l0 + l1 * x).collect();
            let r: Vec<Scalar> = r_0.iter().zip(r_1.iter()).map(|(r0, r1)| r0 + r1 * x).collect();
            let t_hat = inner_product(&l, &r);

            let t_0 = inner_product(&l_0, &r_0);
            if t_hat != t_0 + t_1 * x + t_2 * x * x {
                return Err(RangeProofError::ProofConstruction(
                    "polynomial identity t(x) did not hold".to_string(),
                ));
            }

            let gamma_sum: Scalar = gammas
                .iter()
                .enumerate()
                .map(|(j, gamma)| z_powers[j + 2] * gamma)
                .sum();
            let tau_x = tau2 * x * x + tau1 * x + gamma_sum;
            let mu = alpha + rho * x;

            transcript.append_scalar(b"x", &x);
            transcript.append_scalar(b"tau_x", &tau_x);
            transcript.append_scalar(b"mu", &mu);
            transcript.append_scalar(b"t_hat", &t_hat);
            let x_ip = transcript.challenge_scalar(b"x_ip");
            if x_ip == Scalar::ZERO {
                return Ok(None);
            }

            let folded = match fold(&gens, &x_ip, &y, l, r, &mut transcript) {
                Some(folded) => folded,
                None => return Ok(None),
            };

            Ok(Some(RangeProof {
                Vs: vs.clone(),
                A: a_commit,
                S: s_commit,
                T_1: cap_t_1,
                T_2: cap_t_2,
                tau_x,
                mu,
                t_hat,
                Ls: folded.Ls,
                Rs: folded.Rs,
                a: folded.a,
                b: folded.b,
            }))
        })
    }
}
