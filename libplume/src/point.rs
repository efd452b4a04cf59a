use crate::error::DecodeError;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::{Identity, VartimeMultiscalarMul};
use curve25519_dalek::Scalar;
use hex::FromHexError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical wire form of a group element.
///
/// The all-zero encoding is the identity and imports successfully; any other
/// encoding that does not name a group element is rejected.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PointRepr([u8; 32]);

impl PointRepr {
    pub const IDENTITY: PointRepr = PointRepr([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PointRepr(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn export(p: &RistrettoPoint) -> Self {
        PointRepr(p.compress().to_bytes())
    }

    pub fn import(&self) -> Result<RistrettoPoint, DecodeError> {
        CompressedRistretto(self.0).decompress().ok_or(DecodeError::InvalidPoint)
    }

    pub fn from_hex(hex: &str) -> Result<Self, FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(PointRepr(bytes))
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<&RistrettoPoint> for PointRepr {
    fn from(value: &RistrettoPoint) -> Self {
        PointRepr::export(value)
    }
}

impl fmt::Debug for PointRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointRepr({})", self.as_hex())
    }
}

impl Serialize for PointRepr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for PointRepr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        PointRepr::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Multiplication mode, always an explicit argument.
///
/// `Secure` is constant-time and mandatory whenever the scalar is secret key
/// material. `Fast` may leak timing and is reserved for verification of
/// public data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MulMode {
    Secure,
    Fast,
}

pub fn mul_point(p: &RistrettoPoint, k: &Scalar, mode: MulMode) -> RistrettoPoint {
    match mode {
        MulMode::Secure => p * k,
        MulMode::Fast => RistrettoPoint::vartime_multiscalar_mul([k], [p]),
    }
}

pub fn is_zero(p: &RistrettoPoint) -> bool {
    *p == RistrettoPoint::identity()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scalar::random_scalar;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use rand::rng;

    #[test]
    fn identity_encoding_imports_as_zero() {
        let p = PointRepr::IDENTITY.import().unwrap();
        assert!(is_zero(&p));
        assert_eq!(PointRepr::export(&p), PointRepr::IDENTITY);
    }

    #[test]
    fn import_rejects_garbage() {
        let mut rejected = 0;
        let mut rng = rng();
        for _ in 0..64 {
            let mut bytes = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rng, &mut bytes);
            if PointRepr::from_bytes(bytes).import().is_err() {
                rejected += 1;
            }
        }
        // random 32-byte strings overwhelmingly fail the canonical-form check
        assert!(rejected > 0);
    }

    #[test]
    fn wire_round_trip_and_negation() {
        let mut rng = rng();
        for _ in 0..50 {
            let p = RISTRETTO_BASEPOINT_POINT * random_scalar(&mut rng);
            let wire = PointRepr::export(&p);
            let back = wire.import().unwrap();
            assert_eq!(back, p);
            assert!(!is_zero(&p));
            assert!(is_zero(&(p + (-p))));
        }
    }

    #[test]
    fn doubling_matches_addition() {
        let mut rng = rng();
        let p = RISTRETTO_BASEPOINT_POINT * random_scalar(&mut rng);
        assert_eq!(p + p, p * Scalar::from(2u64));
    }

    #[test]
    fn doubling_chain_covers_every_bit() {
        // 2^bit * G via scalar multiplication must track repeated doubling
        let g = RISTRETTO_BASEPOINT_POINT;
        let two = Scalar::from(2u64);
        let mut s = Scalar::ONE;
        let mut p = g;
        for _ in 1..256 {
            s *= two;
            p = p + p;
            assert!(!is_zero(&p));
            assert_eq!(g * s, p);
        }
    }

    #[test]
    fn fast_and_secure_modes_agree() {
        let mut rng = rng();
        for _ in 0..20 {
            let p = RISTRETTO_BASEPOINT_POINT * random_scalar(&mut rng);
            let k = random_scalar(&mut rng);
            assert_eq!(mul_point(&p, &k, MulMode::Secure), mul_point(&p, &k, MulMode::Fast));
        }
        let k = Scalar::ZERO;
        let p = RISTRETTO_BASEPOINT_POINT;
        assert!(is_zero(&mul_point(&p, &k, MulMode::Secure)));
        assert!(is_zero(&mul_point(&p, &k, MulMode::Fast)));
    }
}
