use crate::error::DecodeError;
use curve25519_dalek::Scalar;
use hex::FromHexError;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical wire form of a scalar: 32 bytes, strictly below the group order.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ScalarRepr([u8; 32]);

impl ScalarRepr {
    pub const ZERO: ScalarRepr = ScalarRepr([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ScalarRepr(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Export a native scalar. The result is always canonical.
    pub fn export(s: &Scalar) -> Self {
        ScalarRepr(s.to_bytes())
    }

    /// Import the wire form. Encodings at or above the group order are
    /// rejected; callers deriving scalars from hashes re-hash and retry.
    pub fn import(&self) -> Result<Scalar, DecodeError> {
        Scalar::from_canonical_bytes(self.0).into_option().ok_or(DecodeError::NonCanonicalScalar)
    }

    pub fn from_hex(hex: &str) -> Result<Self, FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(ScalarRepr(bytes))
    }

    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<&Scalar> for ScalarRepr {
    fn from(value: &Scalar) -> Self {
        ScalarRepr::export(value)
    }
}

impl fmt::Debug for ScalarRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarRepr({})", self.as_hex())
    }
}

impl Serialize for ScalarRepr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for ScalarRepr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        ScalarRepr::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Uniform scalar from 64 bytes of RNG output.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut wide = [0u8; 64];
    rng.fill_bytes(&mut wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// Fixed-base exponentiation with precomputed 8-bit window tables.
///
/// `calculate` treats the wire form as a raw 256-bit little-endian exponent,
/// so values past the group order wrap exactly like iterated multiplication
/// would. One table per byte position keeps a lookup-and-multiply per
/// non-zero digit instead of a full square-and-multiply ladder.
pub struct ScalarGenerator {
    windows: Vec<[Scalar; 255]>,
}

impl ScalarGenerator {
    const WINDOWS: usize = 32;

    pub fn new(base: &Scalar) -> Self {
        let mut windows = Vec::with_capacity(Self::WINDOWS);
        let mut window_base = *base;
        for _ in 0..Self::WINDOWS {
            let mut table = [Scalar::ONE; 255];
            let mut acc = Scalar::ONE;
            for entry in table.iter_mut() {
                acc *= window_base;
                *entry = acc;
            }
            windows.push(table);
            // base for the next window is window_base^256
            window_base = acc * window_base;
        }
        ScalarGenerator { windows }
    }

    /// `base^exp` for the full 256-bit exponent encoded by `exp`.
    pub fn calculate(&self, exp: &ScalarRepr) -> Scalar {
        let mut out = Scalar::ONE;
        for (window, &digit) in self.windows.iter().zip(exp.as_bytes().iter()) {
            if digit != 0 {
                out *= window[digit as usize - 1];
            }
        }
        out
    }
}
