// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Domain-separated hashing for blinding-factor derivation and generator derivation.
//!
//! Every hash use in this crate is tagged with the crate domain, a version byte and a length-prepended label, so
//! that no two uses of the underlying digest can collide. Blinding scalars are reduced from 64 bytes of digest
//! output; generator points are produced with the uniform hash-to-point map.

use blake2::Blake2b;
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use digest::{consts::U64, Digest};

use crate::generators::TokenId;

const DOMAIN: &str = "com.tari.range_proofs";
const VERSION: u8 = 1;

fn tagged_hasher(label: &str) -> Blake2b<U64> {
    let mut hasher = Blake2b::<U64>::new();
    hasher.update((DOMAIN.len() as u64).to_le_bytes());
    hasher.update(DOMAIN.as_bytes());
    hasher.update([VERSION]);
    hasher.update((label.len() as u64).to_le_bytes());
    hasher.update(label.as_bytes());
    hasher
}

/// Derive a blinding scalar from the shared secret and a salt.
///
/// The salts used by the protocol are 1 (`alpha`), 2 (`rho`), 3 (`tau1`), 4 (`tau2`) and `100 + i` for the
/// commitment blinding factor of input value `i`. The same derivation is replayed by the recovery engine, so it
/// must never change across versions.
pub(crate) fn nonce_scalar(nonce: &RistrettoPoint, salt: u64) -> Scalar {
    let mut hasher = tagged_hasher("nonce");
    hasher.update(nonce.compress().as_bytes());
    hasher.update(salt.to_le_bytes());
    let output: [u8; 64] = hasher.finalize().into();
    Scalar::from_bytes_mod_order_wide(&output)
}

/// Derive an independent generator point for a token id. Deterministic: the same `(label, token_id, index)`
/// triple always yields the same point.
pub(crate) fn derive_generator(label: &str, token_id: &TokenId, index: u64) -> RistrettoPoint {
    let mut hasher = tagged_hasher(label);
    hasher.update(token_id.as_bytes());
    hasher.update(index.to_le_bytes());
    let output: [u8; 64] = hasher.finalize().into();
    RistrettoPoint::from_uniform_bytes(&output)
}
