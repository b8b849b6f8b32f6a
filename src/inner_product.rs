// Copyright 2022. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The inner-product argument: a logarithmic-round folding protocol reducing a size-`n` inner-product relation to
//! `O(log n)` group elements.
//!
//! The prover runs this against the bases `Gi` and `Hi' = Hi ∘ y^-i` (the inverse-`y`-power scaling aligns the
//! `Hi` bases with the `y`-weighted right vector; it is absorbed into the working base vector up front, so every
//! round folds plainly). The verifier never runs the folding itself; it replays the round challenges and undoes
//! the folding inside the batch multi-exponentiation.

use std::iter;

use curve25519_dalek::{ristretto::CompressedRistretto, ristretto::RistrettoPoint, scalar::Scalar,
                       traits::VartimeMultiscalarMul};
use merlin::Transcript;

use crate::{
    generators::Generators,
    transcript::TranscriptProtocol,
    util::{inner_product, scalar_powers},
};

/// The output of the folding protocol: the per-round commitments and the two fully folded scalars.
#[allow(non_snake_case)]
pub(crate) struct InnerProductFolding {
    pub Ls: Vec<CompressedRistretto>,
    pub Rs: Vec<CompressedRistretto>,
    pub a: Scalar,
    pub b: Scalar,
}

/// Fold the vectors `l`, `r` down to two scalars, committing one `L`/`R` pair per round and drawing one round
/// challenge per round from the transcript.
///
/// Returns `None` on a zero round challenge; the caller retries the enclosing proof attempt. The vectors must
/// have equal power-of-two length.
#[allow(non_snake_case)]
pub(crate) fn fold(
    gens: &Generators,
    x_ip: &Scalar,
    y: &Scalar,
    l: Vec<Scalar>,
    r: Vec<Scalar>,
    transcript: &mut Transcript,
) -> Option<InnerProductFolding> {
    let n = l.len();
    debug_assert_eq!(n, r.len());
    debug_assert!(n.is_power_of_two());

    let y_inv_powers = scalar_powers(&y.invert(), n);
    let mut g_vec: Vec<RistrettoPoint> = gens.Gi[..n].to_vec();
    let mut h_vec: Vec<RistrettoPoint> = gens.Hi[..n]
        .iter()
        .zip(&y_inv_powers)
        .map(|(h, y_inv)| h * y_inv)
        .collect();
    let mut a_vec = l;
    let mut b_vec = r;

    let rounds = n.trailing_zeros() as usize;
    let mut big_ls = Vec::with_capacity(rounds);
    let mut big_rs = Vec::with_capacity(rounds);

    let mut n_prime = n;
    while n_prime > 1 {
        n_prime /= 2;
        let (a_lo, a_hi) = a_vec.split_at(n_prime);
        let (b_lo, b_hi) = b_vec.split_at(n_prime);
        let (g_lo, g_hi) = g_vec.split_at(n_prime);
        let (h_lo, h_hi) = h_vec.split_at(n_prime);

        let c_l = inner_product(a_lo, b_hi);
        let c_r = inner_product(a_hi, b_lo);

        let big_l = RistrettoPoint::vartime_multiscalar_mul(
            a_lo.iter().chain(b_hi.iter()).chain(iter::once(&(c_l * x_ip))),
            g_hi.iter().chain(h_lo.iter()).chain(iter::once(&gens.H)),
        )
        .compress();
        let big_r = RistrettoPoint::vartime_multiscalar_mul(
            a_hi.iter().chain(b_lo.iter()).chain(iter::once(&(c_r * x_ip))),
            g_lo.iter().chain(h_hi.iter()).chain(iter::once(&gens.H)),
        )
        .compress();

        transcript.append_point(b"L", &big_l);
        transcript.append_point(b"R", &big_r);
        let w = transcript.challenge_scalar(b"w");
        if w == Scalar::ZERO {
            return None;
        }
        let w_inv = w.invert();

        let next_a: Vec<Scalar> = (0..n_prime).map(|i| a_lo[i] * w + a_hi[i] * w_inv).collect();
        let next_b: Vec<Scalar> = (0..n_prime).map(|i| b_lo[i] * w_inv + b_hi[i] * w).collect();
        // the bases are not needed once the vectors are length one
        let (next_g, next_h) = if n_prime > 1 {
            (
                (0..n_prime).map(|i| g_lo[i] * w_inv + g_hi[i] * w).collect(),
                (0..n_prime).map(|i| h_lo[i] * w + h_hi[i] * w_inv).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        a_vec = next_a;
        b_vec = next_b;
        g_vec = next_g;
        h_vec = next_h;
        big_ls.push(big_l);
        big_rs.push(big_r);
    }

    Some(InnerProductFolding {
        Ls: big_ls,
        Rs: big_rs,
        a: a_vec[0],
        b: b_vec[0],
    })
}
