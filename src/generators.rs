// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Deterministic, cached commitment generators, one set per asset/token identifier.

use std::{collections::HashMap, sync::Arc, sync::RwLock};

use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint};
use serde::{Deserialize, Serialize};

use crate::{
    hashing::derive_generator,
    range_proof::{INPUT_VALUE_BITS, MAX_INPUT_VALUES},
};

/// Length of the `Gi`/`Hi` generator vectors: enough for the largest supported aggregation.
pub(crate) const GENERATOR_VECTOR_LENGTH: usize = MAX_INPUT_VALUES.next_power_of_two() * INPUT_VALUE_BITS;

/// An asset/token identifier. The all-zero id (`TokenId::default()`) is the default token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// Create a token id from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        TokenId(bytes)
    }

    /// The raw bytes of the token id.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<u64> for TokenId {
    fn from(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&v.to_le_bytes());
        TokenId(bytes)
    }
}

/// The generator set used for commitments under one token id.
///
/// `H` is the fixed Ristretto basepoint and carries blinding factors; `G` is the per-token value base; `Gi` and
/// `Hi` are the per-token vector bases consumed by the inner-product argument. Identical token ids always yield
/// bit-identical generator sets, across threads and process runs; verifiability depends on it.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generators {
    /// The per-token value base
    pub G: RistrettoPoint,
    /// The blinding base
    pub H: RistrettoPoint,
    /// The vector bases paired with the bit vector `aL`
    pub Gi: Vec<RistrettoPoint>,
    /// The vector bases paired with the bit vector `aR`
    pub Hi: Vec<RistrettoPoint>,
}

impl Generators {
    fn derive(token_id: &TokenId) -> Generators {
        let mut gi = Vec::with_capacity(GENERATOR_VECTOR_LENGTH);
        let mut hi = Vec::with_capacity(GENERATOR_VECTOR_LENGTH);
        for i in 0..GENERATOR_VECTOR_LENGTH as u64 {
            gi.push(derive_generator("vector bases Gi", token_id, i));
            hi.push(derive_generator("vector bases Hi", token_id, i));
        }
        Generators {
            G: derive_generator("value base G", token_id, 0),
            H: RISTRETTO_BASEPOINT_POINT,
            Gi: gi,
            Hi: hi,
        }
    }
}

lazy_static! {
    static ref GENERATOR_CACHE: RwLock<HashMap<TokenId, Arc<Generators>>> = RwLock::new(HashMap::new());
}

/// Process-wide factory for [`Generators`]. Derivation is pure in the token id; the result is computed once and
/// cached behind a read/write lock, with a re-check under the write lock so concurrent first use cannot duplicate
/// work.
pub struct GeneratorFactory;

impl GeneratorFactory {
    /// Return the generator set for `token_id`, deriving and caching it on first use.
    pub fn get_instance(token_id: &TokenId) -> Arc<Generators> {
        {
            let cache = match GENERATOR_CACHE.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(gens) = cache.get(token_id) {
                return Arc::clone(gens);
            }
        }
        let mut cache = match GENERATOR_CACHE.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            cache
                .entry(*token_id)
                .or_insert_with(|| Arc::new(Generators::derive(token_id))),
        )
    }
}
