// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Amount and message recovery from published proof data.
//!
//! The prover derives `alpha`, `rho`, `tau1`, `tau2` and the commitment blinding factors deterministically from
//! the shared secret, so the holder of that secret can re-derive them and peel the packed message and value back
//! out of the published `mu` and `tau_x` scalars. Recovery is best-effort: an item that fails any check (wrong
//! secret, mismatched commitment, malformed dimensions) is silently omitted, never an error.

use curve25519_dalek::{ristretto::CompressedRistretto, ristretto::RistrettoPoint, scalar::Scalar};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    generators::{GeneratorFactory, TokenId},
    hashing::nonce_scalar,
    range_proof::{RangeProof, RangeProofService},
    util::{low_u64, shift_right_64, trimmed_be_bytes},
    verifier::replay_challenges,
};

const LOG_TARGET: &str = "tari_range_proofs::recovery";

/// The subset of a proof's public data, plus the replayed `x` and `z` challenges and the shared secret, needed to
/// attempt recovery of one transaction input.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInToRecover {
    /// Caller-assigned position of this input; carried through to the recovery output.
    pub index: usize,
    /// The proof's value commitments.
    pub Vs: Vec<CompressedRistretto>,
    /// Left inner-product round commitments.
    pub Ls: Vec<CompressedRistretto>,
    /// Right inner-product round commitments.
    pub Rs: Vec<CompressedRistretto>,
    /// The proof's combined blinding scalar.
    pub mu: Scalar,
    /// The proof's `t(x)` blinding scalar.
    pub tau_x: Scalar,
    /// The replayed challenge `x`.
    pub x: Scalar,
    /// The replayed challenge `z`.
    pub z: Scalar,
    /// The shared secret the blinding factors were derived from.
    pub nonce: RistrettoPoint,
}

impl TxInToRecover {
    /// Build a recovery input from a published proof by replaying its transcript for the `x` and `z` challenges.
    /// Returns `None` if any challenge replays to zero.
    pub fn from_proof(index: usize, proof: &RangeProof, nonce: &RistrettoPoint) -> Option<Self> {
        let challenges = replay_challenges(proof)?;
        Some(TxInToRecover {
            index,
            Vs: proof.Vs.clone(),
            Ls: proof.Ls.clone(),
            Rs: proof.Rs.clone(),
            mu: proof.mu,
            tau_x: proof.tau_x,
            x: challenges.x,
            z: challenges.z,
            nonce: *nonce,
        })
    }
}

/// One successfully recovered transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredTxInput {
    /// The caller-assigned index of the recovered input.
    pub index: usize,
    /// The committed amount.
    pub amount: u64,
    /// The blinding factor of the first value commitment.
    pub blinding_factor: Scalar,
    /// The embedded message bytes. Leading zero bytes of either message segment do not survive recovery.
    pub message: Vec<u8>,
}

impl RangeProofService {
    /// Recover the amount, blinding factor and embedded message of each input whose shared secret is correct.
    /// Unrecoverable inputs are omitted from the result; the call itself cannot fail.
    pub fn recover_tx_ins(&self, tx_ins: &[TxInToRecover], token_id: &TokenId) -> Vec<RecoveredTxInput> {
        let gens = GeneratorFactory::get_instance(token_id);
        let mut recovered = Vec::new();
        for tx_in in tx_ins {
            if tx_in.Vs.is_empty() || tx_in.Ls.is_empty() || tx_in.Ls.len() != tx_in.Rs.len() {
                continue;
            }
            if tx_in.x == Scalar::ZERO {
                continue;
            }
            let v_0 = match tx_in.Vs[0].decompress() {
                Some(point) => point,
                None => continue,
            };

            let alpha = nonce_scalar(&tx_in.nonce, 1);
            let rho = nonce_scalar(&tx_in.nonce, 2);
            let tau1 = nonce_scalar(&tx_in.nonce, 3);
            let tau2 = nonce_scalar(&tx_in.nonce, 4);
            let gamma_0 = nonce_scalar(&tx_in.nonce, 100);

            // mu = alpha + message_and_value + rho * x, so peel the known derived parts back off
            let message_v0 = tx_in.mu - rho * tx_in.x - alpha;
            let amount = low_u64(&message_v0);
            if gens.G * Scalar::from(amount) + gens.H * gamma_0 != v_0 {
                debug!(
                    target: LOG_TARGET,
                    "Input {} commitment does not match the derived opening; skipping", tx_in.index
                );
                continue;
            }

            let mut message = trimmed_be_bytes(&shift_right_64(&message_v0));
            let tau2_x_sq = tau2 * tx_in.x * tx_in.x;
            let message_2 = (tx_in.tau_x - tau2_x_sq - tx_in.z * tx_in.z * gamma_0) * tx_in.x.invert() - tau1;
            message.extend(trimmed_be_bytes(&message_2));

            recovered.push(RecoveredTxInput {
                index: tx_in.index,
                amount,
                blinding_factor: gamma_0,
                message,
            });
        }
        recovered
    }
}
