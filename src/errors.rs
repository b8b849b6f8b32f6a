// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Errors used in the range proof crate

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors encountered when constructing range proofs.
///
/// Verification deliberately has no error surface: a malformed or invalid proof verifies as `false`. Recovery
/// likewise never fails as a call; unrecoverable inputs are omitted from the output.
#[derive(Debug, Clone, Error, PartialEq, Eq, Deserialize, Serialize)]
pub enum RangeProofError {
    /// Invalid input was provided to the prover
    #[error("Invalid input was provided to the prover: `{0}`")]
    InvalidInput(String),
    /// Could not construct a range proof
    #[error("Could not construct range proof: `{0}`")]
    ProofConstruction(String),
}
