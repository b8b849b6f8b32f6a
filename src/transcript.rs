// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Fiat-Shamir transcript support.
//!
//! The verifier re-derives every challenge by replaying a proof's public fields through a fresh transcript in the
//! exact order the prover appended them, so the append/challenge sequence defined by the prover is part of the
//! proof format. A challenge equal to zero is a protocol failure signal and must be checked at every derivation
//! point, never ignored.

use curve25519_dalek::{ristretto::CompressedRistretto, scalar::Scalar};
use merlin::Transcript;

const TRANSCRIPT_LABEL: &[u8] = b"tari_range_proofs v1";

/// Start the transcript for one range proof.
pub(crate) fn new_range_proof_transcript() -> Transcript {
    Transcript::new(TRANSCRIPT_LABEL)
}

/// Extension trait binding scalars and group elements into a [`Transcript`].
pub(crate) trait TranscriptProtocol {
    /// Append a compressed group element.
    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto);

    /// Append a scalar.
    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar);

    /// Derive a challenge scalar from everything appended so far.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn append_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.append_message(label, point.as_bytes());
    }

    fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.append_message(label, scalar.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }
}
