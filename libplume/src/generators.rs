use blake2::Blake2b512;
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::Identity;

/// Number of bits a range proof covers; also the inner-product dimension.
pub const DIM: usize = 64;

/// Immutable set of group generators shared by every operation.
///
/// Constructed once at startup and passed by reference into the arithmetic
/// and proof code; there is no ambient global state. `G` is the blinding
/// base, `H` the native value generator, `J` backs public key derivation,
/// `U` binds dot products inside the inner-product argument, and `Gi`/`Hi`
/// are the bulletproof vector generators. All auxiliary generators are
/// derived by domain-separated hashing, so none has a known discrete log
/// relative to another.
pub struct Generators {
    g: RistrettoPoint,
    h: RistrettoPoint,
    j: RistrettoPoint,
    u: RistrettoPoint,
    gi: [RistrettoPoint; DIM],
    hi: [RistrettoPoint; DIM],
}

impl Generators {
    pub fn create() -> Self {
        let mut gi = [RistrettoPoint::identity(); DIM];
        let mut hi = [RistrettoPoint::identity(); DIM];
        for i in 0..DIM {
            gi[i] = hash_to_point(b"plume.gen.Gi", i as u64);
            hi[i] = hash_to_point(b"plume.gen.Hi", i as u64);
        }
        Generators {
            g: RISTRETTO_BASEPOINT_POINT,
            h: hash_to_point(b"plume.gen.H", 0),
            j: hash_to_point(b"plume.gen.J", 0),
            u: hash_to_point(b"plume.gen.U", 0),
            gi,
            hi,
        }
    }

    pub fn g(&self) -> &RistrettoPoint {
        &self.g
    }

    pub fn h(&self) -> &RistrettoPoint {
        &self.h
    }

    pub fn j(&self) -> &RistrettoPoint {
        &self.j
    }

    pub fn u(&self) -> &RistrettoPoint {
        &self.u
    }

    pub fn gi(&self) -> &[RistrettoPoint; DIM] {
        &self.gi
    }

    pub fn hi(&self) -> &[RistrettoPoint; DIM] {
        &self.hi
    }
}

pub(crate) fn hash_to_point(tag: &[u8], index: u64) -> RistrettoPoint {
    let mut input = Vec::with_capacity(tag.len() + 8);
    input.extend_from_slice(tag);
    input.extend_from_slice(&index.to_be_bytes());
    RistrettoPoint::hash_from_bytes::<Blake2b512>(&input)
}
