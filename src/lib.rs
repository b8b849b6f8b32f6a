// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # Aggregated range proofs for confidential transactions
//!
//! This crate implements an aggregated Bulletproof range proof over the Ristretto group, extended with a
//! deterministic side channel: a shared secret ("nonce") drives the derivation of every blinding factor, so the
//! holder of that secret can later recover the committed amount and an embedded message from the published proof
//! alone. The three operations other subsystems are allowed to call are:
//!
//! - [`RangeProofService::prove`] builds one proof covering up to [`MAX_INPUT_VALUES`] committed values and up to
//!   [`MAX_MESSAGE_SIZE`] bytes of message,
//! - [`RangeProofService::verify`] checks one or many proofs as a single randomized multi-exponentiation,
//! - [`RangeProofService::recover_tx_ins`] recovers the amount, blinding factor and message from published proof
//!   data using the shared secret.
//!
//! Verification never returns an error; malformed or adversarial proofs simply verify as `false`. Recovery never
//! fails as a call; inputs that cannot be recovered are omitted from the result.

#[macro_use]
extern crate lazy_static;

pub mod errors;
pub mod generators;
pub mod range_proof;
pub mod recovery;

mod hashing;
mod inner_product;
mod prover;
mod transcript;
mod util;
mod verifier;

pub use crate::{
    errors::RangeProofError,
    generators::{GeneratorFactory, Generators, TokenId},
    range_proof::{RangeProof, RangeProofService, INPUT_VALUE_BITS, MAX_INPUT_VALUES, MAX_MESSAGE_SIZE},
    recovery::{RecoveredTxInput, TxInToRecover},
};
