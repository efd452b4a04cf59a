use crate::generators::Generators;
use crate::kdf::{KeyIdv, KeyType};
use crate::oracle::Oracle;
use crate::point::{mul_point, MulMode};
use crate::range_proof::CreatorParams;
use crate::signature::Signature;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::Scalar;
use serde::{Deserialize, Serialize};

const META_BYTES: usize = 16;
const CHECKSUM_BYTES: usize = 8;
const RECOVERY_BYTES: usize = META_BYTES + CHECKSUM_BYTES;

/// Range proof that reveals the committed value.
///
/// Cheap and privacy-light: the signature binds `commitment − value·H_asset`,
/// proving the value is exactly what the proof says. The derivation path is
/// carried in a seed-scrambled recovery field so the owner can re-identify
/// the output without storing plaintext metadata.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Public {
    pub value: u64,
    pub signature: Signature,
    recovery: [u8; RECOVERY_BYTES],
}

impl Public {
    pub fn create(
        gens: &Generators,
        sk: &Scalar,
        params: &CreatorParams,
        oracle: &mut Oracle,
    ) -> Self {
        let recovery = seal_recovery(params);
        let value = params.kidv.value;
        let msg = message(oracle, value, &recovery);
        let signature = Signature::sign(gens, &msg, sk);
        Public { value, signature, recovery }
    }

    /// Verify against the exact commitment and asset generator the proof was
    /// created for.
    pub fn is_valid(
        &self,
        gens: &Generators,
        oracle: &mut Oracle,
        comm: &RistrettoPoint,
        h_gen: &RistrettoPoint,
    ) -> bool {
        let msg = message(oracle, self.value, &self.recovery);
        // the value is public, so the fast multiplication mode is fine here
        let pk = comm - mul_point(h_gen, &Scalar::from(self.value), MulMode::Fast);
        self.signature.is_valid(gens, &msg, &pk)
    }

    /// Reconstruct the original derivation path from a matching seed.
    pub fn recover(&self, seed: &[u8; 32]) -> Option<KeyIdv> {
        let mut meta = [0u8; META_BYTES];
        let pad = pad(seed);
        for i in 0..META_BYTES {
            meta[i] = self.recovery[i] ^ pad[i];
        }

        let expected = checksum(seed, &meta);
        if self.recovery[META_BYTES..] != expected {
            return None;
        }

        let mut idx = [0u8; 8];
        idx.copy_from_slice(&meta[..8]);
        let mut key_type = [0u8; 4];
        key_type.copy_from_slice(&meta[8..12]);
        let mut sub_idx = [0u8; 4];
        sub_idx.copy_from_slice(&meta[12..16]);
        Some(KeyIdv::new(
            u64::from_le_bytes(idx),
            u32::from_le_bytes(sub_idx),
            KeyType(u32::from_le_bytes(key_type)),
            self.value,
        ))
    }
}

fn message(oracle: &mut Oracle, value: u64, recovery: &[u8; RECOVERY_BYTES]) -> [u8; 32] {
    oracle.feed_u64(value);
    oracle.feed(recovery);
    oracle.draw()
}

fn pad(seed: &[u8; 32]) -> [u8; META_BYTES] {
    let hv = Oracle::new().feed(b"rp.pub.pad").feed(seed).draw();
    let mut out = [0u8; META_BYTES];
    out.copy_from_slice(&hv[..META_BYTES]);
    out
}

fn checksum(seed: &[u8; 32], meta: &[u8; META_BYTES]) -> [u8; CHECKSUM_BYTES] {
    let hv = Oracle::new().feed(b"rp.pub.chk").feed(seed).feed(meta).draw();
    let mut out = [0u8; CHECKSUM_BYTES];
    out.copy_from_slice(&hv[..CHECKSUM_BYTES]);
    out
}

fn seal_recovery(params: &CreatorParams) -> [u8; RECOVERY_BYTES] {
    let mut meta = [0u8; META_BYTES];
    meta[..8].copy_from_slice(&params.kidv.idx.to_le_bytes());
    meta[8..12].copy_from_slice(&params.kidv.key_type.0.to_le_bytes());
    meta[12..16].copy_from_slice(&params.kidv.sub_idx.to_le_bytes());

    let pad = pad(&params.seed);
    let mut out = [0u8; RECOVERY_BYTES];
    for i in 0..META_BYTES {
        out[i] = meta[i] ^ pad[i];
    }
    out[META_BYTES..].copy_from_slice(&checksum(&params.seed, &meta));
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commitment::commit;
    use crate::scalar::random_scalar;
    use rand::{rng, RngCore};

    fn params(value: u64) -> CreatorParams {
        let mut rng = rng();
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        CreatorParams {
            kidv: KeyIdv::new(rng.next_u64(), rng.next_u32(), KeyType(rng.next_u32()), value),
            seed,
        }
    }

    #[test]
    fn round_trip() {
        let gens = Generators::create();
        let mut rng = rng();
        let cp = params(345000);
        let sk = random_scalar(&mut rng);

        let proof = Public::create(&gens, &sk, &cp, &mut Oracle::new());
        assert_eq!(proof.value, cp.kidv.value);

        let comm = commit(&gens, &sk, proof.value, gens.h());
        assert!(proof.is_valid(&gens, &mut Oracle::new(), &comm, gens.h()));

        // recovery with the right seed reproduces the full kidv
        assert_eq!(proof.recover(&cp.seed), Some(cp.kidv));

        // and fails with the wrong one
        let mut wrong = cp.seed;
        wrong[0] ^= 1;
        assert_eq!(proof.recover(&wrong), None);
    }

    #[test]
    fn tampered_value_fails() {
        let gens = Generators::create();
        let mut rng = rng();
        let cp = params(345000);
        let sk = random_scalar(&mut rng);

        let mut proof = Public::create(&gens, &sk, &cp, &mut Oracle::new());
        let comm = commit(&gens, &sk, proof.value, gens.h());

        proof.value += 1;
        assert!(!proof.is_valid(&gens, &mut Oracle::new(), &comm, gens.h()));
        proof.value -= 1;

        // wrong blinding key
        let comm2 = commit(&gens, &random_scalar(&mut rng), proof.value, gens.h());
        assert!(!proof.is_valid(&gens, &mut Oracle::new(), &comm2, gens.h()));
    }

    #[test]
    fn binds_the_asset_generator() {
        let gens = Generators::create();
        let mut rng = rng();
        let cp = params(12345);
        let sk = random_scalar(&mut rng);

        let proof = Public::create(&gens, &sk, &cp, &mut Oracle::new());
        let comm = commit(&gens, &sk, proof.value, gens.h());
        assert!(!proof.is_valid(&gens, &mut Oracle::new(), &comm, gens.u()));
    }
}
