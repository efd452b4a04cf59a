use crate::error::{DecodeError, ProtocolError};
use crate::generators::{Generators, DIM};
use crate::inner_product::{BatchContext, InnerProduct, Modifier};
use crate::kdf::{KeyIdv, KeyType};
use crate::oracle::{hash_to_scalar, Oracle};
use crate::point::PointRepr;
use crate::range_proof::CreatorParams;
use crate::scalar::ScalarRepr;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::{MultiscalarMul, VartimeMultiscalarMul};
use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};

/// Round-1 vector commitments, produced by the finalizing signer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Part1 {
    pub a: PointRepr,
    pub s: PointRepr,
}

/// Round-1 polynomial commitments, aggregated across all co-signers.
/// The default (identity) encoding is the aggregation seed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Part2 {
    pub t1: PointRepr,
    pub t2: PointRepr,
}

/// Round-2 blinding response, aggregated across all co-signers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Part3 {
    pub tau_x: ScalarRepr,
}

/// Position of a `co_sign` call in the multi-party protocol. Phases are
/// ordered and non-skippable:
///
/// ```text
/// Init -> Step1 (peers fold Part2)  -> Step2 (finalize msig, broadcast) ->
///         Step3 (peers fold Part3)  -> Finalize -> Done
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    SinglePass,
    Step2,
    Finalize,
}

/// Challenge snapshot the finalizing signer broadcasts after `Step2`; peers
/// need it to compute their round-2 contributions.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiSig {
    x: Scalar,
    zz: Scalar,
}

impl MultiSig {
    /// Round-1 contribution of a non-finalizing peer: fold the nonce
    /// commitments derived from `seed` into the aggregated `Part2`.
    pub fn co_sign_part(
        gens: &Generators,
        seed: &[u8; 32],
        part2: &mut Part2,
    ) -> Result<(), DecodeError> {
        let tau1 = nonce(seed, b"tau1");
        let tau2 = nonce(seed, b"tau2");
        let t1 = part2.t1.import()? + gens.g() * tau1;
        let t2 = part2.t2.import()? + gens.g() * tau2;
        part2.t1 = PointRepr::export(&t1);
        part2.t2 = PointRepr::export(&t2);
        Ok(())
    }

    /// Round-2 contribution of a non-finalizing peer: fold the blinding
    /// response for `sk` into the aggregated `Part3`.
    pub fn co_sign_part3(
        &self,
        seed: &[u8; 32],
        sk: &Scalar,
        part3: &mut Part3,
    ) -> Result<(), DecodeError> {
        let tau1 = nonce(seed, b"tau1");
        let tau2 = nonce(seed, b"tau2");
        let tau = tau1 * self.x + tau2 * self.x * self.x + self.zz * sk;
        let total = part3.tau_x.import()? + tau;
        part3.tau_x = ScalarRepr::export(&total);
        Ok(())
    }
}

/// Bulletproof-style range proof: hides the committed value while proving it
/// lies in `[0, 2^64)`, via an inner-product argument over the bit
/// decomposition.
///
/// Transcript order (identical for creation and verification):
/// `A,S -> y,z`; `T1,T2 -> x`; `tau_x, mu, t_dot`; inner-product rounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Confidential {
    pub part1: Part1,
    pub part2: Part2,
    pub part3: Part3,
    pub mu: ScalarRepr,
    pub t_dot: ScalarRepr,
    pub p_tag: InnerProduct,
}

impl Confidential {
    /// Single-party creation over a fresh proof.
    pub fn create(
        gens: &Generators,
        sk: &Scalar,
        params: &CreatorParams,
        oracle: &mut Oracle,
        h_gen: &RistrettoPoint,
    ) -> Self {
        let mut proof = Confidential::default();
        proof
            .co_sign(gens, &params.seed, sk, params, oracle, Phase::SinglePass, None, h_gen)
            .expect("single-pass creation starts from zeroed parts");
        proof
    }

    /// Drive one signer's part of the protocol.
    ///
    /// `Step2` expects `part2` to hold every other peer's round-1
    /// contribution and writes the challenge snapshot into `msig`.
    /// `Finalize` expects the finalized `part2` plus every other peer's
    /// round-2 contribution in `part3`. `SinglePass` runs both rounds
    /// locally. Any other combination is a phase-order error.
    #[allow(clippy::too_many_arguments)]
    pub fn co_sign(
        &mut self,
        gens: &Generators,
        seed: &[u8; 32],
        sk: &Scalar,
        params: &CreatorParams,
        oracle: &mut Oracle,
        phase: Phase,
        msig: Option<&mut MultiSig>,
        h_gen: &RistrettoPoint,
    ) -> Result<(), ProtocolError> {
        if (phase == Phase::Step2) != msig.is_some() {
            return Err(ProtocolError::PhaseOrder);
        }

        let value = params.kidv.value;

        // round-1 secrets, deterministic in the seed
        let alpha = nonce(seed, b"alpha") + kid_scalar(&params.kidv, seed);
        let rho = nonce(seed, b"rho");
        let mut sl = [Scalar::ZERO; DIM];
        let mut sr = [Scalar::ZERO; DIM];
        for i in 0..DIM {
            sl[i] = nonce_at(seed, b"sl", i);
            sr[i] = nonce_at(seed, b"sr", i);
        }

        // A = G·alpha + Σ aL_i·Gi + Σ (aL_i − 1)·Hi over the bits of `value`
        let mut a_l = [Scalar::ZERO; DIM];
        {
            let mut scalars = Vec::with_capacity(1 + 2 * DIM);
            let mut points = Vec::with_capacity(1 + 2 * DIM);
            scalars.push(alpha);
            points.push(*gens.g());
            for i in 0..DIM {
                a_l[i] = Scalar::from((value >> i) & 1);
                scalars.push(a_l[i]);
                points.push(gens.gi()[i]);
                scalars.push(a_l[i] - Scalar::ONE);
                points.push(gens.hi()[i]);
            }
            self.part1.a = PointRepr::export(&RistrettoPoint::multiscalar_mul(&scalars, &points));
        }

        // S = G·rho + Σ sL_i·Gi + Σ sR_i·Hi
        {
            let mut scalars = Vec::with_capacity(1 + 2 * DIM);
            let mut points = Vec::with_capacity(1 + 2 * DIM);
            scalars.push(rho);
            points.push(*gens.g());
            for i in 0..DIM {
                scalars.push(sl[i]);
                points.push(gens.gi()[i]);
                scalars.push(sr[i]);
                points.push(gens.hi()[i]);
            }
            self.part1.s = PointRepr::export(&RistrettoPoint::multiscalar_mul(&scalars, &points));
        }

        oracle.feed(self.part1.a.as_bytes());
        oracle.feed(self.part1.s.as_bytes());
        let y = oracle.draw_scalar();
        let z = oracle.draw_scalar();
        let zz = z * z;

        // l(X) = (aL − z·1) + sL·X
        // r(X) = y^i ∘ (aR + z·1 + sR·X) + z²·2^i
        let mut y_pow = [Scalar::ONE; DIM];
        let mut two_pow = [Scalar::ONE; DIM];
        for i in 1..DIM {
            y_pow[i] = y_pow[i - 1] * y;
            two_pow[i] = two_pow[i - 1] + two_pow[i - 1];
        }

        let mut l0 = [Scalar::ZERO; DIM];
        let mut r0 = [Scalar::ZERO; DIM];
        let mut t1 = Scalar::ZERO;
        let mut t2 = Scalar::ZERO;
        for i in 0..DIM {
            l0[i] = a_l[i] - z;
            r0[i] = y_pow[i] * (a_l[i] - Scalar::ONE + z) + zz * two_pow[i];
            let r1 = y_pow[i] * sr[i];
            t1 += l0[i] * r1 + sl[i] * r0[i];
            t2 += sl[i] * r1;
        }

        let tau1 = nonce(seed, b"tau1");
        let tau2 = nonce(seed, b"tau2");

        if phase != Phase::Finalize {
            // fold our polynomial commitments into the aggregated Part2
            let t1_pt = self.part2.t1.import().map_err(ProtocolError::Decode)?
                + RistrettoPoint::multiscalar_mul([&t1, &tau1], [h_gen, gens.g()]);
            let t2_pt = self.part2.t2.import().map_err(ProtocolError::Decode)?
                + RistrettoPoint::multiscalar_mul([&t2, &tau2], [h_gen, gens.g()]);
            self.part2.t1 = PointRepr::export(&t1_pt);
            self.part2.t2 = PointRepr::export(&t2_pt);
        }

        oracle.feed(self.part2.t1.as_bytes());
        oracle.feed(self.part2.t2.as_bytes());
        let x = oracle.draw_scalar();

        if phase == Phase::Step2 {
            if let Some(out) = msig {
                *out = MultiSig { x, zz };
            }
            return Ok(());
        }

        // round 2: fold our blinding response into the aggregated Part3
        let tau_own = tau1 * x + tau2 * x * x + zz * sk;
        let tau_total = self.part3.tau_x.import().map_err(ProtocolError::Decode)? + tau_own;
        self.part3.tau_x = ScalarRepr::export(&tau_total);

        let mu = alpha + rho * x;
        self.mu = ScalarRepr::export(&mu);

        let mut l = [Scalar::ZERO; DIM];
        let mut r = [Scalar::ZERO; DIM];
        for i in 0..DIM {
            l[i] = l0[i] + sl[i] * x;
            r[i] = r0[i] + y_pow[i] * sr[i] * x;
        }
        let t_dot = InnerProduct::dot(&l, &r);
        self.t_dot = ScalarRepr::export(&t_dot);

        oracle.feed(self.part3.tau_x.as_bytes());
        oracle.feed(self.mu.as_bytes());
        oracle.feed(self.t_dot.as_bytes());

        let y_inv = y.invert();
        let modifier = Modifier { multiplier: [None, Some(&y_inv)] };
        let (p_tag, _comm) = InnerProduct::create_with(gens, oracle, &l, &r, &t_dot, &modifier);
        self.p_tag = p_tag;
        Ok(())
    }

    /// One-shot verification without batching.
    pub fn is_valid(
        &self,
        gens: &Generators,
        oracle: &mut Oracle,
        comm: &RistrettoPoint,
        h_gen: &RistrettoPoint,
    ) -> bool {
        let mut batch = BatchContext::new(false);
        self.is_valid_with(gens, &mut batch, oracle, comm, h_gen)
    }

    /// Add the proof's two equations (the t-polynomial check and the
    /// inner-product check) to `batch` under independent random weights.
    pub fn is_valid_with(
        &self,
        gens: &Generators,
        batch: &mut BatchContext,
        oracle: &mut Oracle,
        comm: &RistrettoPoint,
        h_gen: &RistrettoPoint,
    ) -> bool {
        let parts = (
            self.part1.a.import(),
            self.part1.s.import(),
            self.part2.t1.import(),
            self.part2.t2.import(),
        );
        let (a_pt, s_pt, t1_pt, t2_pt) = match parts {
            (Ok(a), Ok(s), Ok(t1), Ok(t2)) => (a, s, t1, t2),
            _ => return false,
        };
        let fields = (self.part3.tau_x.import(), self.mu.import(), self.t_dot.import());
        let (tau_x, mu, t_dot) = match fields {
            (Ok(t), Ok(m), Ok(d)) => (t, m, d),
            _ => return false,
        };

        oracle.feed(self.part1.a.as_bytes());
        oracle.feed(self.part1.s.as_bytes());
        let y = oracle.draw_scalar();
        let z = oracle.draw_scalar();
        let zz = z * z;

        oracle.feed(self.part2.t1.as_bytes());
        oracle.feed(self.part2.t2.as_bytes());
        let x = oracle.draw_scalar();
        let xx = x * x;

        oracle.feed(self.part3.tau_x.as_bytes());
        oracle.feed(self.mu.as_bytes());
        oracle.feed(self.t_dot.as_bytes());

        // Σ y^i and Σ 2^i over the proof dimension
        let mut sum_y = Scalar::ZERO;
        let mut y_i = Scalar::ONE;
        for _ in 0..DIM {
            sum_y += y_i;
            y_i *= y;
        }
        let sum_two = Scalar::from(u64::MAX);
        let delta = (z - zz) * sum_y - z * zz * sum_two;

        // equation 1: z²·V + delta·H + x·T1 + x²·T2 − t_dot·H − tau_x·G == 0
        batch.equation_begin();
        batch.add_casual(comm, zz);
        batch.add_casual(h_gen, delta - t_dot);
        batch.add_casual(&t1_pt, x);
        batch.add_casual(&t2_pt, xx);
        batch.add_base_g(-tau_x);
        if !batch.equation_end(gens) {
            return false;
        }

        // equation 2: the inner-product relation over
        // P = A + x·S − mu·G − z·ΣGi + Σ (z + z²·2^i·y^{-i})·Hi
        let y_inv = y.invert();
        let p = {
            let mut scalars = Vec::with_capacity(3 + 2 * DIM);
            let mut points = Vec::with_capacity(3 + 2 * DIM);
            scalars.push(Scalar::ONE);
            points.push(a_pt);
            scalars.push(x);
            points.push(s_pt);
            scalars.push(-mu);
            points.push(*gens.g());
            let mut y_inv_i = Scalar::ONE;
            let mut two_i = Scalar::ONE;
            for i in 0..DIM {
                scalars.push(-z);
                points.push(gens.gi()[i]);
                scalars.push(z + zz * two_i * y_inv_i);
                points.push(gens.hi()[i]);
                y_inv_i *= y_inv;
                two_i += two_i;
            }
            RistrettoPoint::vartime_multiscalar_mul(&scalars, &points)
        };

        let modifier = Modifier { multiplier: [None, Some(&y_inv)] };
        self.p_tag.is_valid_with(gens, batch, oracle, &p, &t_dot, &modifier)
    }

    /// Replay the transcript and extract the derivation path embedded in
    /// `mu`; returns `None` unless `seed` matches the creator's.
    pub fn recover(&self, oracle: &mut Oracle, seed: &[u8; 32]) -> Option<KeyIdv> {
        let mu = self.mu.import().ok()?;

        oracle.feed(self.part1.a.as_bytes());
        oracle.feed(self.part1.s.as_bytes());
        let _y = oracle.draw_scalar();
        let _z = oracle.draw_scalar();
        oracle.feed(self.part2.t1.as_bytes());
        oracle.feed(self.part2.t2.as_bytes());
        let x = oracle.draw_scalar();

        let alpha_nonce = nonce(seed, b"alpha");
        let rho = nonce(seed, b"rho");
        let kid = mu - rho * x - alpha_nonce;
        decode_kid(&kid.to_bytes(), seed)
    }
}

fn nonce(seed: &[u8; 32], label: &[u8]) -> Scalar {
    hash_to_scalar(&[b"bp.nonce", seed, label])
}

fn nonce_at(seed: &[u8; 32], label: &[u8], index: usize) -> Scalar {
    hash_to_scalar(&[b"bp.nonce", seed, label, &(index as u64).to_be_bytes()])
}

/// Pack the derivation path into a canonical scalar: little-endian idx, type,
/// sub-index and value, then a seed-keyed 7-byte checksum, top byte zero.
fn kid_scalar(kidv: &KeyIdv, seed: &[u8; 32]) -> Scalar {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&kidv.idx.to_le_bytes());
    bytes[8..12].copy_from_slice(&kidv.key_type.0.to_le_bytes());
    bytes[12..16].copy_from_slice(&kidv.sub_idx.to_le_bytes());
    bytes[16..24].copy_from_slice(&kidv.value.to_le_bytes());
    let check = kid_checksum(seed, &bytes);
    bytes[24..31].copy_from_slice(&check[..7]);
    Scalar::from_bytes_mod_order(bytes)
}

fn decode_kid(bytes: &[u8; 32], seed: &[u8; 32]) -> Option<KeyIdv> {
    if bytes[31] != 0 {
        return None;
    }
    let check = kid_checksum(seed, bytes);
    if bytes[24..31] != check[..7] {
        return None;
    }
    let mut idx = [0u8; 8];
    idx.copy_from_slice(&bytes[..8]);
    let mut key_type = [0u8; 4];
    key_type.copy_from_slice(&bytes[8..12]);
    let mut sub_idx = [0u8; 4];
    sub_idx.copy_from_slice(&bytes[12..16]);
    let mut value = [0u8; 8];
    value.copy_from_slice(&bytes[16..24]);
    Some(KeyIdv::new(
        u64::from_le_bytes(idx),
        u32::from_le_bytes(sub_idx),
        KeyType(u32::from_le_bytes(key_type)),
        u64::from_le_bytes(value),
    ))
}

fn kid_checksum(seed: &[u8; 32], bytes: &[u8; 32]) -> [u8; 32] {
    Oracle::new().feed(b"bp.kid.chk").feed(seed).feed(&bytes[..24]).draw()
}
