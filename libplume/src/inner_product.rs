use crate::generators::{Generators, DIM};
use crate::oracle::Oracle;
use crate::point::PointRepr;
use crate::scalar::{random_scalar, ScalarRepr};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::{Identity, MultiscalarMul, VartimeMultiscalarMul};
use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};
use std::iter::once;

/// Number of halving rounds: `2^CYCLES == DIM`.
pub const CYCLES: usize = 6;

/// Optional per-side power-series multipliers folded into the generator
/// coefficients: index `i` on side `s` is scaled by `multiplier[s]^i`.
#[derive(Clone, Copy, Default)]
pub struct Modifier<'a> {
    pub multiplier: [Option<&'a Scalar>; 2],
}

impl Modifier<'_> {
    fn coefficients(&self, side: usize) -> [Scalar; DIM] {
        let mut out = [Scalar::ONE; DIM];
        if let Some(m) = self.multiplier[side] {
            for i in 1..DIM {
                out[i] = out[i - 1] * m;
            }
        }
        out
    }
}

/// Logarithmic-size proof that two committed vectors have a given dot
/// product: per round the vectors are halved, the cross terms are committed
/// as L/R, a challenge folds the halves, and two condensed scalars remain.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct InnerProduct {
    pub lr: [[PointRepr; 2]; CYCLES],
    pub condensed: [ScalarRepr; 2],
}

impl InnerProduct {
    pub fn dot(a: &[Scalar; DIM], b: &[Scalar; DIM]) -> Scalar {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    /// Create a proof of `⟨a,b⟩ = dot` on a caller transcript, returning the
    /// vector commitment the proof is relative to. Feeds and draws mirror
    /// `is_valid_with` exactly.
    pub fn create_with(
        gens: &Generators,
        oracle: &mut Oracle,
        a: &[Scalar; DIM],
        b: &[Scalar; DIM],
        dot: &Scalar,
        modifier: &Modifier,
    ) -> (Self, RistrettoPoint) {
        let gc = modifier.coefficients(0);
        let hc = modifier.coefficients(1);

        // modified generator vectors, folded in place round by round
        let mut gv: Vec<RistrettoPoint> = (0..DIM).map(|i| gens.gi()[i] * gc[i]).collect();
        let mut hv: Vec<RistrettoPoint> = (0..DIM).map(|i| gens.hi()[i] * hc[i]).collect();
        let mut av = a.to_vec();
        let mut bv = b.to_vec();

        let comm = RistrettoPoint::multiscalar_mul(
            av.iter().chain(bv.iter()),
            gv.iter().chain(hv.iter()),
        );

        oracle.feed_scalar(dot);
        oracle.feed_point(&comm);

        let mut lr = [[PointRepr::IDENTITY; 2]; CYCLES];
        let mut n = DIM;
        for cycle in 0..CYCLES {
            let half = n / 2;

            let c_l: Scalar = (0..half).map(|i| av[i] * bv[i + half]).sum();
            let c_r: Scalar = (0..half).map(|i| av[i + half] * bv[i]).sum();

            let l_pt = RistrettoPoint::multiscalar_mul(
                av[..half].iter().chain(bv[half..n].iter()).chain(once(&c_l)),
                gv[half..n].iter().chain(hv[..half].iter()).chain(once(gens.u())),
            );
            let r_pt = RistrettoPoint::multiscalar_mul(
                av[half..n].iter().chain(bv[..half].iter()).chain(once(&c_r)),
                gv[..half].iter().chain(hv[half..n].iter()).chain(once(gens.u())),
            );

            oracle.feed_point(&l_pt);
            oracle.feed_point(&r_pt);
            let x = oracle.draw_scalar();
            let x_inv = x.invert();

            for i in 0..half {
                av[i] = av[i] * x + av[i + half] * x_inv;
                bv[i] = bv[i] * x_inv + bv[i + half] * x;
                gv[i] = gv[i] * x_inv + gv[i + half] * x;
                hv[i] = hv[i] * x + hv[i + half] * x_inv;
            }
            av.truncate(half);
            bv.truncate(half);
            gv.truncate(half);
            hv.truncate(half);

            lr[cycle] = [PointRepr::export(&l_pt), PointRepr::export(&r_pt)];
            n = half;
        }

        let proof = InnerProduct {
            lr,
            condensed: [ScalarRepr::export(&av[0]), ScalarRepr::export(&bv[0])],
        };
        (proof, comm)
    }

    /// Standalone creation with a fresh transcript.
    pub fn create(
        gens: &Generators,
        a: &[Scalar; DIM],
        b: &[Scalar; DIM],
        dot: &Scalar,
        modifier: &Modifier,
    ) -> (Self, RistrettoPoint) {
        let mut oracle = Oracle::new();
        Self::create_with(gens, &mut oracle, a, b, dot, modifier)
    }

    /// Add this proof's verification equation to `batch`; checked immediately
    /// when batching is disabled, deferred to `flush` otherwise.
    pub fn is_valid_with(
        &self,
        gens: &Generators,
        batch: &mut BatchContext,
        oracle: &mut Oracle,
        comm: &RistrettoPoint,
        dot: &Scalar,
        modifier: &Modifier,
    ) -> bool {
        let mut l_pts = [RistrettoPoint::identity(); CYCLES];
        let mut r_pts = [RistrettoPoint::identity(); CYCLES];
        for (cycle, pair) in self.lr.iter().enumerate() {
            match (pair[0].import(), pair[1].import()) {
                (Ok(l), Ok(r)) => {
                    l_pts[cycle] = l;
                    r_pts[cycle] = r;
                }
                _ => return false,
            }
        }
        let (a_f, b_f) = match (self.condensed[0].import(), self.condensed[1].import()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return false,
        };

        oracle.feed_scalar(dot);
        oracle.feed_point(comm);

        let mut x = [Scalar::ONE; CYCLES];
        let mut x_inv = [Scalar::ONE; CYCLES];
        for cycle in 0..CYCLES {
            oracle.feed(self.lr[cycle][0].as_bytes());
            oracle.feed(self.lr[cycle][1].as_bytes());
            x[cycle] = oracle.draw_scalar();
            x_inv[cycle] = x[cycle].invert();
        }

        batch.equation_begin();

        let gc = modifier.coefficients(0);
        let hc = modifier.coefficients(1);
        for i in 0..DIM {
            let mut s = Scalar::ONE;
            let mut s_inv = Scalar::ONE;
            for cycle in 0..CYCLES {
                if (i >> (CYCLES - 1 - cycle)) & 1 == 1 {
                    s *= x[cycle];
                    s_inv *= x_inv[cycle];
                } else {
                    s *= x_inv[cycle];
                    s_inv *= x[cycle];
                }
            }
            batch.add_gi(i, a_f * s * gc[i]);
            batch.add_hi(i, b_f * s_inv * hc[i]);
        }

        batch.add_base_u(a_f * b_f - dot);
        batch.add_casual(comm, -Scalar::ONE);
        for cycle in 0..CYCLES {
            batch.add_casual(&l_pts[cycle], -(x[cycle] * x[cycle]));
            batch.add_casual(&r_pts[cycle], -(x_inv[cycle] * x_inv[cycle]));
        }

        batch.equation_end(gens)
    }

    /// One-shot verification with a fresh transcript and no batching.
    pub fn is_valid(
        &self,
        gens: &Generators,
        comm: &RistrettoPoint,
        dot: &Scalar,
        modifier: &Modifier,
    ) -> bool {
        let mut batch = BatchContext::new(false);
        let mut oracle = Oracle::new();
        self.is_valid_with(gens, &mut batch, &mut oracle, comm, dot, modifier)
    }
}

/// Accumulates many verification equations into a single variable-time
/// multi-exponentiation.
///
/// Every equation is scaled by an internally drawn random weight, so a false
/// equation cannot cancel against an honest one and accumulation order does
/// not matter. `flush` performs one equality check for everything added so
/// far and resets the context; the batch is all-or-nothing. With
/// `enable_batch == false`, `equation_end` flushes each equation on the spot.
pub struct BatchContext {
    pub enable_batch: bool,
    k_g: Scalar,
    k_u: Scalar,
    k_gi: [Scalar; DIM],
    k_hi: [Scalar; DIM],
    casual: Vec<(RistrettoPoint, Scalar)>,
    weight: Scalar,
}

impl BatchContext {
    pub fn new(enable_batch: bool) -> Self {
        BatchContext {
            enable_batch,
            k_g: Scalar::ZERO,
            k_u: Scalar::ZERO,
            k_gi: [Scalar::ZERO; DIM],
            k_hi: [Scalar::ZERO; DIM],
            casual: Vec::new(),
            weight: Scalar::ONE,
        }
    }

    /// Start a new equation under a fresh random weight. The weight comes
    /// from the process RNG, never from the prover.
    pub fn equation_begin(&mut self) {
        let mut rng = rand::rng();
        loop {
            let w = random_scalar(&mut rng);
            if w != Scalar::ZERO {
                self.weight = w;
                break;
            }
        }
    }

    /// Close the current equation: immediate check when batching is off,
    /// deferred to `flush` otherwise.
    pub fn equation_end(&mut self, gens: &Generators) -> bool {
        if self.enable_batch {
            true
        } else {
            self.flush(gens)
        }
    }

    pub fn add_base_g(&mut self, k: Scalar) {
        self.k_g += self.weight * k;
    }

    pub fn add_base_u(&mut self, k: Scalar) {
        self.k_u += self.weight * k;
    }

    pub fn add_gi(&mut self, i: usize, k: Scalar) {
        self.k_gi[i] += self.weight * k;
    }

    pub fn add_hi(&mut self, i: usize, k: Scalar) {
        self.k_hi[i] += self.weight * k;
    }

    pub fn add_casual(&mut self, p: &RistrettoPoint, k: Scalar) {
        self.casual.push((*p, self.weight * k));
    }

    /// Evaluate everything accumulated in one multi-exponentiation and reset.
    pub fn flush(&mut self, gens: &Generators) -> bool {
        let mut scalars = Vec::with_capacity(2 + 2 * DIM + self.casual.len());
        let mut points = Vec::with_capacity(scalars.capacity());

        scalars.push(self.k_g);
        points.push(*gens.g());
        scalars.push(self.k_u);
        points.push(*gens.u());
        for i in 0..DIM {
            scalars.push(self.k_gi[i]);
            points.push(gens.gi()[i]);
            scalars.push(self.k_hi[i]);
            points.push(gens.hi()[i]);
        }
        for (p, k) in &self.casual {
            scalars.push(*k);
            points.push(*p);
        }

        let sum = RistrettoPoint::vartime_multiscalar_mul(&scalars, &points);

        self.k_g = Scalar::ZERO;
        self.k_u = Scalar::ZERO;
        self.k_gi = [Scalar::ZERO; DIM];
        self.k_hi = [Scalar::ZERO; DIM];
        self.casual.clear();
        self.weight = Scalar::ONE;

        sum == RistrettoPoint::identity()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rng;

    fn random_vectors() -> ([Scalar; DIM], [Scalar; DIM]) {
        let mut rng = rng();
        let mut a = [Scalar::ZERO; DIM];
        let mut b = [Scalar::ZERO; DIM];
        for i in 0..DIM {
            a[i] = random_scalar(&mut rng);
            b[i] = random_scalar(&mut rng);
        }
        (a, b)
    }

    #[test]
    fn create_and_verify() {
        let gens = Generators::create();
        let (a, b) = random_vectors();
        let dot = InnerProduct::dot(&a, &b);

        let (proof, comm) = InnerProduct::create(&gens, &a, &b, &dot, &Modifier::default());
        assert!(proof.is_valid(&gens, &comm, &dot, &Modifier::default()));

        // wrong dot product
        assert!(!proof.is_valid(&gens, &comm, &(dot + Scalar::ONE), &Modifier::default()));

        // wrong commitment
        let bad_comm = comm + *gens.g();
        assert!(!proof.is_valid(&gens, &bad_comm, &dot, &Modifier::default()));
    }

    #[test]
    fn modifier_changes_the_relation() {
        let gens = Generators::create();
        let mut rng = rng();
        let (a, b) = random_vectors();
        let dot = InnerProduct::dot(&a, &b);

        let pwr = random_scalar(&mut rng);
        let modifier = Modifier { multiplier: [None, Some(&pwr)] };

        let (proof, comm) = InnerProduct::create(&gens, &a, &b, &dot, &modifier);
        assert!(proof.is_valid(&gens, &comm, &dot, &modifier));

        // verifying without the modifier must fail
        assert!(!proof.is_valid(&gens, &comm, &dot, &Modifier::default()));
    }

    #[test]
    fn tampered_cross_terms_fail() {
        let gens = Generators::create();
        let (a, b) = random_vectors();
        let dot = InnerProduct::dot(&a, &b);
        let (mut proof, comm) = InnerProduct::create(&gens, &a, &b, &dot, &Modifier::default());

        proof.lr[3][0] = PointRepr::export(&(gens.g() + gens.u()));
        assert!(!proof.is_valid(&gens, &comm, &dot, &Modifier::default()));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let gens = Generators::create();
        let mut batch = BatchContext::new(true);

        let (a0, b0) = random_vectors();
        let dot0 = InnerProduct::dot(&a0, &b0);
        let (p0, c0) = InnerProduct::create(&gens, &a0, &b0, &dot0, &Modifier::default());

        let (a1, b1) = random_vectors();
        let dot1 = InnerProduct::dot(&a1, &b1);
        let (p1, c1) = InnerProduct::create(&gens, &a1, &b1, &dot1, &Modifier::default());

        let mut oracle = Oracle::new();
        assert!(p0.is_valid_with(&gens, &mut batch, &mut oracle, &c0, &dot0, &Modifier::default()));
        let mut oracle = Oracle::new();
        assert!(p1.is_valid_with(&gens, &mut batch, &mut oracle, &c1, &dot1, &Modifier::default()));
        assert!(batch.flush(&gens));

        // one corrupted entry poisons the whole flushed group
        let mut oracle = Oracle::new();
        assert!(p0.is_valid_with(&gens, &mut batch, &mut oracle, &c0, &dot0, &Modifier::default()));
        let mut oracle = Oracle::new();
        assert!(p1.is_valid_with(
            &gens,
            &mut batch,
            &mut oracle,
            &c1,
            &(dot1 + Scalar::ONE),
            &Modifier::default()
        ));
        assert!(!batch.flush(&gens));

        // an empty batch flushes clean
        assert!(batch.flush(&gens));
    }
}
