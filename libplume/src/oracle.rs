use blake2::{Blake2b, Blake2b512, Digest};
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::Scalar;
use digest::consts::U32;

type TranscriptHash = Blake2b<U32>;

/// Fiat-Shamir transcript: a running hash that turns everything fed so far
/// into deterministic challenges.
///
/// `draw` re-seeds the internal state from its own output, so two consecutive
/// draws differ even without intervening feeds. Proof creation and
/// verification must feed values in exactly the same order or verification
/// fails; the order is part of each proof's definition.
#[derive(Clone, Default)]
pub struct Oracle {
    hasher: TranscriptHash,
}

impl Oracle {
    pub fn new() -> Self {
        Oracle { hasher: TranscriptHash::new() }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> &mut Self {
        Digest::update(&mut self.hasher, bytes);
        self
    }

    pub fn feed_u32(&mut self, value: u32) -> &mut Self {
        self.feed(&value.to_be_bytes())
    }

    pub fn feed_u64(&mut self, value: u64) -> &mut Self {
        self.feed(&value.to_be_bytes())
    }

    pub fn feed_scalar(&mut self, s: &Scalar) -> &mut Self {
        self.feed(s.as_bytes())
    }

    pub fn feed_point(&mut self, p: &RistrettoPoint) -> &mut Self {
        self.feed(p.compress().as_bytes())
    }

    /// Extract 32 bytes and re-seed the state from them.
    pub fn draw(&mut self) -> [u8; 32] {
        let out: [u8; 32] = self.hasher.finalize_reset().into();
        Digest::update(&mut self.hasher, out);
        out
    }

    /// Draw a scalar, re-hashing until the output is canonical.
    pub fn draw_scalar(&mut self) -> Scalar {
        loop {
            if let Some(s) = Scalar::from_canonical_bytes(self.draw()).into_option() {
                return s;
            }
        }
    }
}

/// Keyed hash to a scalar with wide reduction; used for deterministic nonces
/// and child keys outside transcript contexts.
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Blake2b512::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    Scalar::from_hash(hasher)
}
