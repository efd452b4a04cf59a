use crate::generators::Generators;
use crate::oracle::{hash_to_scalar, Oracle};
use crate::point::PointRepr;
use crate::scalar::{random_scalar, ScalarRepr};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use curve25519_dalek::Scalar;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Schnorr signature over a 32-byte message.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Signature {
    pub nonce_pub: PointRepr,
    pub k: ScalarRepr,
}

impl Signature {
    fn challenge(nonce_pub: &PointRepr, msg: &[u8; 32]) -> Scalar {
        Oracle::new().feed(b"sig").feed(nonce_pub.as_bytes()).feed(msg).draw_scalar()
    }

    /// Sign `msg` with `sk`. The nonce is derived from the key and message,
    /// so signing does not depend on an external randomness source.
    pub fn sign(gens: &Generators, msg: &[u8; 32], sk: &Scalar) -> Self {
        let nonce = Zeroizing::new(hash_to_scalar(&[b"sig.nonce", sk.as_bytes(), msg]));
        let nonce_pub = PointRepr::export(&(gens.g() * &*nonce));
        let e = Self::challenge(&nonce_pub, msg);
        let k = *nonce - e * sk;
        Signature { nonce_pub, k: ScalarRepr::export(&k) }
    }

    /// Exact verification of `G·k + e·PK == nonce_pub`; no tolerance.
    pub fn is_valid(&self, gens: &Generators, msg: &[u8; 32], pk: &RistrettoPoint) -> bool {
        let (nonce_pub, k) = match (self.nonce_pub.import(), self.k.import()) {
            (Ok(p), Ok(k)) => (p, k),
            _ => return false,
        };
        let e = Self::challenge(&self.nonce_pub, msg);
        RistrettoPoint::vartime_multiscalar_mul([&k, &e], [gens.g(), pk]) == nonce_pub
    }
}

/// Local state of one co-signer: a private nonce and the aggregate public
/// nonce, i.e. the sum of every peer's `G·nonce`.
pub struct MultiSig {
    pub nonce: Zeroizing<Scalar>,
    pub nonce_pub: RistrettoPoint,
}

impl MultiSig {
    /// Draw a fresh private nonce; the caller circulates `G·nonce` and later
    /// stores the aggregate back into `nonce_pub`.
    pub fn generate<R: RngCore + CryptoRng>(gens: &Generators, rng: &mut R) -> Self {
        let nonce = Zeroizing::new(random_scalar(rng));
        let nonce_pub = gens.g() * &*nonce;
        MultiSig { nonce, nonce_pub }
    }

    /// Partial response over the shared nonce with this peer's key. The final
    /// signature's response is the sum of all partials.
    pub fn sign_partial(&self, msg: &[u8; 32], sk: &Scalar) -> Scalar {
        let nonce_pub = PointRepr::export(&self.nonce_pub);
        let e = Signature::challenge(&nonce_pub, msg);
        *self.nonce - e * sk
    }

    /// Assemble the final signature from the aggregate nonce and partials.
    pub fn finalize(nonce_pub: &RistrettoPoint, partials: impl IntoIterator<Item = Scalar>) -> Signature {
        let k: Scalar = partials.into_iter().sum();
        Signature { nonce_pub: PointRepr::export(nonce_pub), k: ScalarRepr::export(&k) }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rng, RngCore};

    fn random_msg<R: RngCore>(rng: &mut R) -> [u8; 32] {
        let mut msg = [0u8; 32];
        rng.fill_bytes(&mut msg);
        msg
    }

    #[test]
    fn sign_and_verify() {
        let gens = Generators::create();
        let mut rng = rng();

        for _ in 0..30 {
            let sk = random_scalar(&mut rng);
            let pk = gens.g() * sk;
            let msg = random_msg(&mut rng);

            let sig = Signature::sign(&gens, &msg, &sk);
            assert!(sig.is_valid(&gens, &msg, &pk));

            // tampered message
            let mut msg2 = msg;
            msg2[0] ^= 1;
            assert!(!sig.is_valid(&gens, &msg2, &pk));

            // different key
            let sk2 = random_scalar(&mut rng);
            let sig2 = Signature::sign(&gens, &msg, &sk2);
            assert!(!sig2.is_valid(&gens, &msg, &pk));

            // tampered nonce point
            let mut bad = sig;
            bad.nonce_pub = PointRepr::export(&(gens.g() * random_scalar(&mut rng)));
            assert!(!bad.is_valid(&gens, &msg, &pk));

            // tampered response scalar
            let mut bad = sig;
            bad.k = ScalarRepr::export(&random_scalar(&mut rng));
            assert!(!bad.is_valid(&gens, &msg, &pk));
        }
    }

    #[test]
    fn partials_compose() {
        let gens = Generators::create();
        let mut rng = rng();
        let msg = random_msg(&mut rng);

        let sk0 = random_scalar(&mut rng);
        let sk1 = random_scalar(&mut rng);
        let pk_total = gens.g() * (sk0 + sk1);

        let mut m0 = MultiSig::generate(&gens, &mut rng);
        let mut m1 = MultiSig::generate(&gens, &mut rng);
        let total_nonce = m0.nonce_pub + m1.nonce_pub;
        m0.nonce_pub = total_nonce;
        m1.nonce_pub = total_nonce;

        let k0 = m0.sign_partial(&msg, &sk0);
        let k1 = m1.sign_partial(&msg, &sk1);
        let sig = MultiSig::finalize(&total_nonce, [k0, k1]);
        assert!(sig.is_valid(&gens, &msg, &pk_total));

        // a partial over the wrong message must not compose
        let mut msg2 = msg;
        msg2[7] ^= 0x80;
        let bad = MultiSig::finalize(&total_nonce, [k0, m1.sign_partial(&msg2, &sk1)]);
        assert!(!bad.is_valid(&gens, &msg, &pk_total));

        // a partial with the wrong key must not compose
        let sk_bad = random_scalar(&mut rng);
        let bad = MultiSig::finalize(&total_nonce, [k0, m1.sign_partial(&msg, &sk_bad)]);
        assert!(!bad.is_valid(&gens, &msg, &pk_total));
    }
}
